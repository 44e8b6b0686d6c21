//! Completeness checks on a fetched dataset.

use std::collections::HashSet;

use tracing::debug;

use crate::error::ValidationError;
use crate::model::Dataset;

/// Checks that every declared result was fetched and that no id repeats.
///
/// # Errors
///
/// Returns the first violation found: a total/count mismatch is reported
/// before any duplicate id.
pub fn validate(dataset: &Dataset) -> Result<(), ValidationError> {
    let fetched = dataset.businesses.len() as u64;
    if dataset.total != fetched {
        return Err(ValidationError::TotalMismatch {
            declared: dataset.total,
            fetched,
        });
    }

    let mut seen = HashSet::with_capacity(dataset.businesses.len());
    for business in &dataset.businesses {
        if !seen.insert(business.id.as_str()) {
            return Err(ValidationError::DuplicateId(business.id.clone()));
        }
    }

    debug!(total = dataset.total, "Dataset validated");
    Ok(())
}
