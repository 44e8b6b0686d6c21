//! Business listings as returned by the search API, and their scored form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RatingError;
use crate::stats::{to_display, to_fraction, weighted_score};

/// A single business listing.
///
/// Only the fields used for scoring and summaries are typed; everything else
/// in the API record is kept in `extra` so archives round-trip the full
/// listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub rating: f64,
    pub review_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Business {
    pub fn new(id: &str, rating: f64, review_count: u64) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            url: String::new(),
            rating,
            review_count,
            extra: Map::new(),
        }
    }

    pub fn with_display(mut self, name: &str, url: &str) -> Self {
        self.name = name.to_string();
        self.url = url.to_string();
        self
    }

    /// Weighted rating on the star scale.
    pub fn weighted_rating(&self, confidence_level: f64) -> Result<f64, RatingError> {
        let fraction = to_fraction(self.rating);
        Ok(to_display(weighted_score(
            fraction,
            self.review_count,
            confidence_level,
        )?))
    }
}

/// The merged result of a paginated search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub businesses: Vec<Business>,
    pub total: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    pub fn new(businesses: Vec<Business>, total: u64) -> Self {
        Self {
            businesses,
            total,
            extra: Map::new(),
        }
    }
}

/// Typed view of one page response.
///
/// `businesses` is optional so a response that omits it can be reported as a
/// contract error rather than a parse failure.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    pub businesses: Option<Vec<Business>>,
    pub total: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A business together with its derived weighted rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBusiness {
    #[serde(flatten)]
    pub business: Business,
    #[serde(rename = "weightedRating")]
    pub weighted_rating: f64,
}

impl ScoredBusiness {
    pub fn new(business: Business, weighted_rating: f64) -> Self {
        Self {
            business,
            weighted_rating,
        }
    }

    pub fn id(&self) -> &str {
        &self.business.id
    }
}
