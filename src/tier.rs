//! Threshold tiering of scored businesses.
//!
//! Each threshold takes the businesses still untiered whose weighted rating
//! meets it. Those become a terminal tier, sorted best-first; the rest carry
//! forward to the next (lower) threshold.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::error::{RatingError, TierError};
use crate::model::{Business, ScoredBusiness};
use crate::stats::z_score;

/// Businesses that met one threshold, sorted descending by weighted rating.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub threshold: f64,
    pub passed: Vec<ScoredBusiness>,
}

/// Outcome of running every threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Tiering {
    pub tiers: Vec<Tier>,
    /// Businesses that failed all thresholds, in input order.
    pub remainder: Vec<ScoredBusiness>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEntry<'a> {
    rating: f64,
    weighted_rating: f64,
    url: &'a str,
}

/// `{ id: { rating, weightedRating, url } }` in tier order.
struct Summary<'a>(&'a [ScoredBusiness]);

impl Serialize for Summary<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for scored in self.0 {
            map.serialize_entry(
                scored.id(),
                &SummaryEntry {
                    rating: scored.business.rating,
                    weighted_rating: scored.weighted_rating,
                    url: &scored.business.url,
                },
            )?;
        }
        map.end()
    }
}

/// A tier is written as its businesses followed by one trailing summary
/// object for quick lookup.
impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.passed.len() + 1))?;
        for scored in &self.passed {
            seq.serialize_element(scored)?;
        }
        seq.serialize_element(&Summary(&self.passed))?;
        seq.end()
    }
}

/// Attaches a weighted rating to one business.
///
/// Businesses without reviews score 0.0 so they always fall through to the
/// remainder.
pub fn score(business: Business, confidence_level: f64) -> Result<ScoredBusiness, RatingError> {
    let weighted_rating = match business.weighted_rating(confidence_level) {
        Ok(rating) => rating,
        Err(RatingError::NoReviews) => {
            warn!(id = %business.id, "Business has no reviews, scoring 0");
            0.0
        }
        Err(e) => return Err(e),
    };
    Ok(ScoredBusiness::new(business, weighted_rating))
}

/// Scores every business, preserving order.
pub fn score_all(
    businesses: Vec<Business>,
    confidence_level: f64,
) -> Result<Vec<ScoredBusiness>, RatingError> {
    businesses
        .into_iter()
        .map(|b| score(b, confidence_level))
        .collect()
}

/// Splits `businesses` at `threshold`.
///
/// Returns `(passed, remaining)`. `passed` is sorted descending by weighted
/// rating (stable, so ties keep input order); `remaining` keeps input order.
pub fn partition(
    businesses: Vec<ScoredBusiness>,
    threshold: f64,
) -> (Vec<ScoredBusiness>, Vec<ScoredBusiness>) {
    let (mut passed, remaining): (Vec<_>, Vec<_>) = businesses
        .into_iter()
        .partition(|b| b.weighted_rating >= threshold);

    passed.sort_by(|a, b| b.weighted_rating.total_cmp(&a.weighted_rating));
    (passed, remaining)
}

/// Checks that thresholds are finite and strictly descending.
pub fn check_thresholds(thresholds: &[f64]) -> Result<(), TierError> {
    let finite = thresholds.iter().all(|t| t.is_finite());
    let descending = thresholds.windows(2).all(|w| w[0] > w[1]);
    if finite && descending {
        Ok(())
    } else {
        Err(TierError::UnorderedThresholds(thresholds.to_vec()))
    }
}

/// Scores `businesses` and runs each threshold in turn over what is left.
pub fn tier(
    businesses: Vec<Business>,
    thresholds: &[f64],
    confidence_level: f64,
) -> Result<Tiering, TierError> {
    check_thresholds(thresholds)?;
    z_score(confidence_level)?;

    let scored = score_all(businesses, confidence_level)?;
    Ok(tier_scored(scored, thresholds))
}

/// Runs each threshold over already-scored businesses.
pub fn tier_scored(scored: Vec<ScoredBusiness>, thresholds: &[f64]) -> Tiering {
    let mut remaining = scored;
    let mut tiers = Vec::with_capacity(thresholds.len());

    for &threshold in thresholds {
        let (passed, rest) = partition(remaining, threshold);
        info!(
            threshold,
            passed = passed.len(),
            remaining = rest.len(),
            "Threshold applied"
        );
        tiers.push(Tier { threshold, passed });
        remaining = rest;
    }

    Tiering {
        tiers,
        remainder: remaining,
    }
}
