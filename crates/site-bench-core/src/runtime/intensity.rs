// crates/site-bench-core/src/runtime/intensity.rs
// ============================================================================
// Module: Site Bench Intensity Scaler
// Description: Maps a 0-100 intensity onto generator iteration counts.
// Purpose: Keep every generator's scaling rule identical and pure.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! `scale(base, intensity)` computes `round(base * max(0.01, intensity / 100))`.
//! The 1% floor means intensity 0 still performs a small amount of work; for
//! any positive base the result is at least 1.

use crate::core::Intensity;

/// Lowest scaling factor applied, reached at intensity 0.
pub const MIN_INTENSITY_FACTOR: f64 = 0.01;

/// Scales `base_iterations` by `intensity`.
///
/// # Invariants
/// - Monotonically non-decreasing in `intensity`.
/// - Returns 0 only when `base_iterations` is 0.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "Scaled value is non-negative, rounded, and saturated to u64 range."
)]
pub fn scale(base_iterations: u64, intensity: Intensity) -> u64 {
    if base_iterations == 0 {
        return 0;
    }
    let factor = (f64::from(intensity.percent()) / 100.0).max(MIN_INTENSITY_FACTOR);
    let scaled = (base_iterations as f64 * factor).round();
    let iterations = if scaled >= u64::MAX as f64 { u64::MAX } else { scaled as u64 };
    iterations.max(1)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_intensity_keeps_base() {
        assert_eq!(scale(2_000_000, Intensity::MAX), 2_000_000);
    }

    #[test]
    fn half_intensity_rounds() {
        assert_eq!(scale(25_000, Intensity::DEFAULT), 12_500);
        assert_eq!(scale(3, Intensity::DEFAULT), 2);
    }

    #[test]
    fn zero_intensity_uses_one_percent_floor() {
        assert_eq!(scale(2_000, Intensity::MIN), 20);
        assert_eq!(scale(250, Intensity::MIN), 3);
    }

    #[test]
    fn small_bases_never_scale_to_zero() {
        assert_eq!(scale(10, Intensity::MIN), 1);
        assert_eq!(scale(1, Intensity::clamped(1)), 1);
    }

    #[test]
    fn zero_base_stays_zero() {
        assert_eq!(scale(0, Intensity::MAX), 0);
    }
}
