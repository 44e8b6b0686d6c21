use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::FetchError;
use crate::model::{Business, Dataset, SearchPage};
use crate::output::Archive;
use crate::services::search_api::{SearchApi, SearchQuery};

/// Builds the query for a 1-based page number.
pub fn page_query(config: &SearchConfig, page: u32) -> Result<SearchQuery, FetchError> {
    if page < 1 {
        return Err(FetchError::InvalidPage(page));
    }
    Ok(SearchQuery {
        term: config.term.clone(),
        location: config.location.clone(),
        radius: config.radius,
        categories: config.categories.clone(),
        limit: config.page_size,
        offset: (page - 1) * config.page_size,
    })
}

#[tracing::instrument(skip(api, config, archive))]
async fn fetch_page<A: SearchApi + ?Sized>(
    api: &A,
    config: &SearchConfig,
    archive: &Archive,
    page: u32,
) -> Result<(Vec<Business>, SearchPage)> {
    let query = page_query(config, page)?;
    debug!(offset = query.offset, limit = query.limit, "Requesting page");

    let body: Value = api.search(&query).await?;
    archive.write_page(page, &body)?;

    let mut parsed: SearchPage = serde_json::from_value(body)
        .with_context(|| format!("Malformed search response on page {page}"))?;
    let businesses = parsed
        .businesses
        .take()
        .ok_or(FetchError::MissingBusinesses { page })?;

    Ok((businesses, parsed))
}

/// Fetches every page for `config` and returns the merged dataset.
///
/// Each raw page is archived before it is merged, and the merged result is
/// written as the run snapshot and the canonical dataset. Any contract
/// violation aborts immediately; there are no retries.
#[tracing::instrument(skip(api, config, archive), fields(location = %config.location))]
pub async fn search<A: SearchApi + ?Sized>(
    api: &A,
    config: &SearchConfig,
    archive: &Archive,
) -> Result<Dataset> {
    info!("Running new API search");

    let (mut businesses, first) = fetch_page(api, config, archive, 1).await?;
    let total = first.total;
    info!(fetched = businesses.len(), total, "Page merged");

    let mut page = 1;
    while (businesses.len() as u64) < total {
        page += 1;
        info!(page, "Running new API request");

        let (more, next) = fetch_page(api, config, archive, page).await?;
        if next.total != total {
            return Err(FetchError::TotalChanged {
                page,
                expected: total,
                found: next.total,
            }
            .into());
        }
        if more.is_empty() {
            return Err(FetchError::EmptyPage {
                page,
                fetched: businesses.len() as u64,
                total,
            }
            .into());
        }

        businesses.extend(more);
        info!(fetched = businesses.len(), total, "Page merged");
    }

    let dataset = Dataset {
        businesses,
        total,
        extra: first.extra,
    };
    archive.write_dataset(&dataset)?;

    Ok(dataset)
}
