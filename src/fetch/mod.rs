mod basic;
mod client;
mod paginate;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use paginate::{page_query, search};

use anyhow::{Result, anyhow};

/// Sends a GET to `url` and parses the body as JSON.
///
/// Non-success statuses are reported with the response body, which is where
/// the search API puts its error description.
pub async fn fetch_json<C: HttpClient>(client: &C, url: reqwest::Url) -> Result<serde_json::Value> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("Search API returned status {}: {}", status, body));
    }

    resp.json()
        .await
        .map_err(|e| anyhow!("Failed to parse search response: {}", e))
}
