//! Error types for each stage of a rating run.
//!
//! Library stages return these typed errors; the pipeline driver and the
//! binary wrap them in [`anyhow::Error`] with context.

use thiserror::Error;

/// Rejected inputs to the rating estimator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RatingError {
    #[error("Confidence level must be strictly between 0 and 1: {0}")]
    InvalidConfidence(f64),

    #[error("Rating fraction must be within [0, 1]: {0}")]
    InvalidFraction(f64),

    #[error("Cannot estimate a rating from zero reviews")]
    NoReviews,
}

/// Search API contract violations. All of them abort the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Page number must be at least 1: {0}")]
    InvalidPage(u32),

    #[error("Request failed to return businesses (page {page})")]
    MissingBusinesses { page: u32 },

    #[error("Page {page} declared total {found}, expected {expected}")]
    TotalChanged { page: u32, expected: u64, found: u64 },

    #[error("Page {page} returned no businesses with {fetched}/{total} fetched")]
    EmptyPage { page: u32, fetched: u64, total: u64 },
}

/// Dataset integrity failures found before any tiering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Mismatch in result length from search API: {declared}!={fetched}")]
    TotalMismatch { declared: u64, fetched: u64 },

    #[error("Duplicate ID found: {0}")]
    DuplicateId(String),
}

/// Invalid tiering parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TierError {
    #[error("Thresholds must be finite and strictly descending: {0:?}")]
    UnorderedThresholds(Vec<f64>),

    #[error(transparent)]
    Rating(#[from] RatingError),
}

/// Missing or malformed run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_KEY must be set to fetch new results")]
    MissingApiKey,

    #[error("Page size must be between 1 and {max}: {value}")]
    InvalidPageSize { value: u32, max: u32 },
}
