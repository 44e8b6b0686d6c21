use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;

use listing_rater::fetch::auth::ApiKey;
use listing_rater::fetch::{BasicClient, HttpClient, fetch_json};
use listing_rater::services::search_api::{SearchApi, SearchQuery};

const SEARCH_URL: &str = "https://api.yelp.com/v3/businesses/search";

/// Yelp Fusion business search.
pub struct YelpClient<C = ApiKey<BasicClient>> {
    base_url: Url,
    http: C,
}

impl YelpClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let http = ApiKey::bearer(BasicClient::new()?, api_key)?;
        Self::with_client(http, SEARCH_URL)
    }
}

impl<C: HttpClient> YelpClient<C> {
    pub fn with_client(http: C, base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid search URL '{base_url}'"))?;
        Ok(Self { base_url, http })
    }

    fn search_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("term", &query.term)
            .append_pair("location", &query.location)
            .append_pair("radius", &query.radius.to_string())
            .append_pair("categories", &query.categories.join(","))
            .append_pair("limit", &query.limit.to_string())
            .append_pair("offset", &query.offset.to_string());
        url
    }
}

#[async_trait]
impl<C: HttpClient> SearchApi for YelpClient<C> {
    async fn search(&self, query: &SearchQuery) -> Result<serde_json::Value> {
        fetch_json(&self.http, self.search_url(query)).await
    }
}
