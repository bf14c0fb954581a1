//! Progress scale conversion
//!
//! Schedule tasks track completion as a fraction in `[0, 1]`; activity rows as
//! a percentage in `[0, 100]`. Percentages are rounded to six decimals so that
//! a fraction like `0.99` maps back to exactly `99.0`.

const PRECISION: f64 = 1_000_000.0;

/// Fraction to percentage, clamped to `[0, 100]`
#[must_use]
pub fn fraction_to_percentage(fraction: f64) -> f64 {
    if !fraction.is_finite() {
        return 0.0;
    }
    round_percentage(fraction * 100.0).clamp(0.0, 100.0)
}

/// Round to six decimals
#[inline]
#[must_use]
pub fn round_percentage(percentage: f64) -> f64 {
    (percentage * PRECISION).round() / PRECISION
}

/// Percentage to fraction
#[must_use]
pub fn percentage_to_fraction(percentage: f64) -> f64 {
    percentage / 100.0
}

/// Whether a percentage is acceptable input
#[inline]
#[must_use]
pub fn is_valid_percentage(percentage: f64) -> bool {
    percentage.is_finite() && (0.0..=100.0).contains(&percentage)
}
