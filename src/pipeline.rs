//! Load-or-fetch, validate, tier, write.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::{RunConfig, SearchConfig};
use crate::fetch::search;
use crate::model::{Business, Dataset};
use crate::output::Archive;
use crate::stats::{confidence_interval, to_display, to_fraction, weighted_score};
use crate::services::search_api::SearchApi;
use crate::tier::{Tiering, tier};
use crate::validate::validate;

/// Runs one rating pass under `run_config.output_dir`.
///
/// The saved `out.json` is reused unless `refresh` is set. `connect` is only
/// called on a cache miss, so a cached run needs no credentials.
#[tracing::instrument(skip_all, fields(output_dir = %run_config.output_dir.display()))]
pub async fn run<A, F>(connect: F, run_config: &RunConfig, clock: &dyn Clock) -> Result<Tiering>
where
    A: SearchApi,
    F: FnOnce() -> Result<(A, SearchConfig)>,
{
    run_config
        .validate()
        .context("Invalid run configuration")?;
    let archive = run_config.archive(clock);

    let dataset = match cached_dataset(run_config, &archive)? {
        Some(dataset) => dataset,
        None => {
            let (api, search_config) = connect()?;
            search(&api, &search_config, &archive).await?
        }
    };

    let tiering = process(dataset, run_config, &archive)?;
    for t in &tiering.tiers {
        info!(
            threshold = t.threshold,
            passed = t.passed.len(),
            path = %archive.tier_path(t.threshold).display(),
            "Tier written"
        );
    }
    Ok(tiering)
}

/// The saved dataset, unless a refresh was asked for or none exists yet.
fn cached_dataset(run: &RunConfig, archive: &Archive) -> Result<Option<Dataset>> {
    if run.refresh {
        return Ok(None);
    }
    let cached = archive.load_dataset()?;
    if cached.is_some() {
        info!(
            path = %archive.canonical_path().display(),
            "Using saved results; delete the file to fetch again"
        );
    }
    Ok(cached)
}

/// Logs each business's confidence interval and weighted rating on the star
/// scale.
fn report_intervals(businesses: &[Business], confidence_level: f64) {
    for business in businesses {
        let fraction = to_fraction(business.rating);
        let interval = confidence_interval(fraction, business.review_count, confidence_level);
        let weighted = weighted_score(fraction, business.review_count, confidence_level);

        match (interval, weighted) {
            (Ok((lower, upper)), Ok(weighted)) => info!(
                id = %business.id,
                rating = business.rating,
                review_count = business.review_count,
                lower = %format!("{:.3}", to_display(lower)),
                upper = %format!("{:.3}", to_display(upper)),
                weighted = %format!("{:.3}", to_display(weighted)),
                "Rating interval"
            ),
            (Err(e), _) | (_, Err(e)) => warn!(
                id = %business.id,
                rating = business.rating,
                review_count = business.review_count,
                error = %e,
                "Rating interval unavailable"
            ),
        }
    }
}

/// Validates `dataset`, tiers it and writes every tier plus the businesses
/// that failed all thresholds.
///
/// Nothing is written if validation fails.
#[tracing::instrument(skip_all, fields(total = dataset.total))]
fn process(dataset: Dataset, run: &RunConfig, archive: &Archive) -> Result<Tiering> {
    validate(&dataset)?;
    info!(total = dataset.total, "Number of results");

    if run.intervals {
        report_intervals(&dataset.businesses, run.confidence_level);
    }

    let tiering = tier(dataset.businesses, &run.thresholds, run.confidence_level)?;

    for t in &tiering.tiers {
        archive.write_tier(t)?;
    }

    info!(
        failed = tiering.remainder.len(),
        "Businesses that did not meet any threshold"
    );
    archive.write_failed(&tiering.remainder)?;

    Ok(tiering)
}
