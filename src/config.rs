//! Run configuration.
//!
//! [`SearchConfig`] describes what to ask the search API for;
//! [`RunConfig`] describes how to score, tier and where to write. Both are
//! built once at startup and passed down explicitly.

use std::path::PathBuf;

use crate::clock::Clock;
use crate::error::{ConfigError, TierError};
use crate::output::Archive;
use crate::stats::z_score;
use crate::tier::check_thresholds;

pub const DEFAULT_TERM: &str = "affordable vet";
pub const DEFAULT_CATEGORY: &str = "vet";
/// Search radius in meters.
pub const DEFAULT_RADIUS: u32 = 40_000;
/// Largest page the search API will return.
pub const MAX_PAGE_SIZE: u32 = 50;
pub const DEFAULT_THRESHOLDS: [f64; 4] = [4.8, 4.5, 4.3, 4.0];
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub location: String,
    pub term: String,
    pub categories: Vec<String>,
    pub radius: u32,
    pub page_size: u32,
}

impl SearchConfig {
    pub fn new(api_key: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            location: location.into(),
            term: DEFAULT_TERM.to_string(),
            categories: vec![DEFAULT_CATEGORY.to_string()],
            radius: DEFAULT_RADIUS,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Reads the API key from `API_KEY`. Load `.env` before calling.
    pub fn from_env(location: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = std::env::var("API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        Ok(Self::new(api_key, location))
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, ConfigError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize {
                value: page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        self.page_size = page_size;
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Star-scale cutoffs, highest first.
    pub thresholds: Vec<f64>,
    /// Scrutiny in (0, 1); higher is stricter.
    pub confidence_level: f64,
    pub output_dir: PathBuf,
    /// Fetch even when `out.json` already exists.
    pub refresh: bool,
    /// Log each business's confidence interval before tiering.
    pub intervals: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            confidence_level: DEFAULT_CONFIDENCE,
            output_dir: PathBuf::from("."),
            refresh: false,
            intervals: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), TierError> {
        check_thresholds(&self.thresholds)?;
        z_score(self.confidence_level)?;
        Ok(())
    }

    /// Output layout under `output_dir`, stamped by `clock`.
    pub fn archive(&self, clock: &dyn Clock) -> Archive {
        Archive::new(&self.output_dir, clock.stamp())
    }
}
