//! Rating estimator.
//!
//! Converts a raw `(average rating, review count)` pair into a confidence
//! interval and a Wilson score lower bound. All inputs are fractions of the
//! rating scale; use [`to_fraction`] and [`to_display`] to move between the
//! 0–5 star scale and [0, 1].

use crate::error::RatingError;

/// Upper end of the star scale used by the search API.
pub const RATING_SCALE: f64 = 5.0;

/// Converts a star rating into a fraction of [`RATING_SCALE`].
pub fn to_fraction(rating: f64) -> f64 {
    rating / RATING_SCALE
}

/// Converts a fraction back onto the star scale.
pub fn to_display(fraction: f64) -> f64 {
    fraction * RATING_SCALE
}

// Acklam's rational approximation coefficients.
const A: [f64; 6] = [
    -3.969683028665376e+01,
    2.209460984245205e+02,
    -2.759285104469687e+02,
    1.383577518672690e+02,
    -3.066479806614716e+01,
    2.506628277459239e+00,
];
const B: [f64; 5] = [
    -5.447609879822406e+01,
    1.615858368580409e+02,
    -1.556989798598866e+02,
    6.680131188771972e+01,
    -1.328068155288572e+01,
];
const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
    4.374664141464968e+00,
    2.938163982698783e+00,
];
const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];

const P_LOW: f64 = 0.02425;

/// Inverse of the standard normal CDF.
///
/// Relative error is below 1.2e-9 on (0, 1). Returns `-inf`/`+inf` at the
/// endpoints and `NaN` outside [0, 1].
pub fn inverse_normal_cdf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        tail(q)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -tail(q)
    }
}

fn tail(q: f64) -> f64 {
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}

/// Two-tailed z-score for a confidence level (e.g. `0.95` → ~1.96).
pub fn z_score(confidence_level: f64) -> Result<f64, RatingError> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(RatingError::InvalidConfidence(confidence_level));
    }
    let alpha = 1.0 - confidence_level;
    Ok(inverse_normal_cdf(1.0 - alpha / 2.0))
}

fn check_inputs(rating_fraction: f64, review_count: u64) -> Result<f64, RatingError> {
    if !(0.0..=1.0).contains(&rating_fraction) {
        return Err(RatingError::InvalidFraction(rating_fraction));
    }
    if review_count == 0 {
        return Err(RatingError::NoReviews);
    }
    Ok(review_count as f64)
}

/// Normal-approximation confidence interval around `rating_fraction`.
///
/// Returns `(lower, upper)`. Bounds are not clamped and may leave [0, 1] for
/// small samples.
///
/// # Errors
///
/// Fails on an out-of-range fraction or confidence level, or when
/// `review_count` is zero.
pub fn confidence_interval(
    rating_fraction: f64,
    review_count: u64,
    confidence_level: f64,
) -> Result<(f64, f64), RatingError> {
    let n = check_inputs(rating_fraction, review_count)?;
    let z = z_score(confidence_level)?;

    let standard_error = (rating_fraction * (1.0 - rating_fraction) / n).sqrt();
    let margin_of_error = z * standard_error;

    Ok((
        rating_fraction - margin_of_error,
        rating_fraction + margin_of_error,
    ))
}

/// Wilson score lower bound for `rating_fraction` observed over
/// `review_count` reviews.
///
/// The result is a fraction in [0, 1]; callers rescale with [`to_display`].
///
/// # Errors
///
/// Same conditions as [`confidence_interval`].
pub fn weighted_score(
    rating_fraction: f64,
    review_count: u64,
    confidence_level: f64,
) -> Result<f64, RatingError> {
    let n = check_inputs(rating_fraction, review_count)?;
    let z = z_score(confidence_level)?;
    let z2 = z * z;
    let p = rating_fraction;

    let center = p + z2 / (2.0 * n);
    let margin = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt();
    let denominator = 1.0 + z2 / n;

    // p = 0 lands a hair off zero in either direction
    Ok(((center - margin) / denominator).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_inverse_normal_cdf_known_quantiles() {
        assert_approx(inverse_normal_cdf(0.5), 0.0);
        assert_approx(inverse_normal_cdf(0.975), 1.959963985);
        assert_approx(inverse_normal_cdf(0.95), 1.644853627);
        assert_approx(inverse_normal_cdf(0.995), 2.575829304);
        assert_approx(inverse_normal_cdf(0.01), -2.326347874);
    }

    #[test]
    fn test_inverse_normal_cdf_endpoints() {
        assert_eq!(inverse_normal_cdf(0.0), f64::NEG_INFINITY);
        assert_eq!(inverse_normal_cdf(1.0), f64::INFINITY);
        assert!(inverse_normal_cdf(1.5).is_nan());
    }

    #[test]
    fn test_z_score_rejects_out_of_range_confidence() {
        assert_eq!(z_score(0.0), Err(RatingError::InvalidConfidence(0.0)));
        assert_eq!(z_score(1.0), Err(RatingError::InvalidConfidence(1.0)));
        assert!(z_score(f64::NAN).is_err());
    }

    #[test]
    fn test_known_value() {
        let z = z_score(0.95).unwrap();
        assert_approx(z, 1.959964);

        let score = weighted_score(to_fraction(4.6), 49, 0.95).unwrap();
        assert_approx(score, 0.810203);
        assert!((to_display(score) - 4.051).abs() < 1e-3);

        let (lower, upper) = confidence_interval(0.92, 49, 0.95).unwrap();
        assert_approx(lower, 0.844039);
        assert_approx(upper, 0.995961);
    }

    #[test]
    fn test_matches_reference_wilson_values() {
        assert_approx(weighted_score(1.0, 10, 0.95).unwrap(), 0.722467);
        assert_approx(weighted_score(0.8, 100, 0.95).unwrap(), 0.711171);
        assert_approx(weighted_score(0.5, 2, 0.95).unwrap(), 0.094531);
    }

    #[test]
    fn test_zero_reviews_rejected() {
        assert_eq!(weighted_score(0.9, 0, 0.95), Err(RatingError::NoReviews));
        assert_eq!(
            confidence_interval(0.9, 0, 0.95),
            Err(RatingError::NoReviews)
        );
    }

    #[test]
    fn test_fraction_out_of_range_rejected() {
        assert_eq!(
            weighted_score(4.6, 10, 0.95),
            Err(RatingError::InvalidFraction(4.6))
        );
        assert!(weighted_score(f64::NAN, 10, 0.95).is_err());
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        for n in [1, 2, 5, 49, 1000] {
            for step in 0..=20 {
                let p = step as f64 / 20.0;
                let s = weighted_score(p, n, 0.95).unwrap();
                assert!((0.0..=1.0).contains(&s), "p={p} n={n} -> {s}");
            }
        }
    }

    #[test]
    fn test_score_monotonic_in_fraction() {
        for n in [1, 3, 49, 500] {
            let mut prev = 0.0;
            for step in 0..=50 {
                let p = step as f64 / 50.0;
                let s = weighted_score(p, n, 0.95).unwrap();
                assert!(s >= prev, "p={p} n={n}: {s} < {prev}");
                prev = s;
            }
        }
    }

    #[test]
    fn test_score_monotonic_in_review_count() {
        for p in [0.0, 0.3, 0.7, 0.92, 0.99] {
            let mut prev = 0.0;
            for n in 1..=300 {
                let s = weighted_score(p, n, 0.95).unwrap();
                assert!(s + 1e-12 >= prev, "p={p} n={n}: {s} < {prev}");
                prev = s;
            }
        }
    }

    #[test]
    fn test_interval_brackets_fraction() {
        for n in [1, 7, 49, 1000] {
            for step in 0..=10 {
                let p = step as f64 / 10.0;
                let (lower, upper) = confidence_interval(p, n, 0.9).unwrap();
                assert!(lower <= p && p <= upper);
            }
        }
    }

    #[test]
    fn test_higher_confidence_is_stricter() {
        let loose = weighted_score(0.9, 20, 0.8).unwrap();
        let strict = weighted_score(0.9, 20, 0.99).unwrap();
        assert!(strict < loose);
    }
}
