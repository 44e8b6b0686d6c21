//! Trait and query type for a paginated business search provider.

use anyhow::Result;

/// One page request against the search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub location: String,
    /// Meters.
    pub radius: u32,
    pub categories: Vec<String>,
    pub limit: u32,
    pub offset: u32,
}

/// Abstraction over a business search provider (e.g., Yelp Fusion).
#[async_trait::async_trait]
pub trait SearchApi {
    /// Returns the raw JSON body of one page of results.
    ///
    /// The body is returned untyped so it can be archived exactly as received.
    async fn search(&self, query: &SearchQuery) -> Result<serde_json::Value>;
}

#[async_trait::async_trait]
impl<'a, T: SearchApi + Sync + ?Sized> SearchApi for &'a T {
    async fn search(&self, query: &SearchQuery) -> Result<serde_json::Value> {
        (**self).search(query).await
    }
}
