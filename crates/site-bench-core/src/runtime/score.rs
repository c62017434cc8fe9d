// crates/site-bench-core/src/runtime/score.rs
// ============================================================================
// Module: Site Bench Score Normalizer
// Description: Converts raw per-test metrics into weighted score components.
// Purpose: Make scores comparable across tests and runs.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Time-based tests score `(reference / max(elapsed, MIN_DURATION_SECONDS)) *
//! weight`; the memory test scores `(reference / peak_megabytes) * weight`
//! with peak floored at [`MIN_MEMORY_BYTES`]. Higher is better everywhere.
//! Tests absent from the input contribute exactly zero.
//!
//! The normalizer is pure: no I/O, no clock, no randomness.

use crate::core::RawTestMetrics;
use crate::core::ScoreComponents;
use crate::core::TestKind;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reference compute duration in seconds.
pub const COMPUTE_REFERENCE_SECONDS: f64 = 1.0;
/// Reference peak memory in megabytes.
pub const MEMORY_REFERENCE_MEGABYTES: f64 = 32.0;
/// Reference storage read duration in seconds.
pub const STORAGE_READ_REFERENCE_SECONDS: f64 = 0.5;
/// Reference storage write duration in seconds.
pub const STORAGE_WRITE_REFERENCE_SECONDS: f64 = 0.5;
/// Weight applied to every component.
pub const SCORE_WEIGHT: f64 = 1000.0;
/// Floor applied to elapsed times before dividing.
pub const MIN_DURATION_SECONDS: f64 = 0.001;
/// Floor applied to peak memory before dividing.
pub const MIN_MEMORY_BYTES: u64 = 1024;

/// Bytes per megabyte for memory scoring.
const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

// ============================================================================
// SECTION: Normalizer
// ============================================================================

/// Scores a set of per-test metrics.
///
/// Only the first metrics entry of each kind is scored.
///
/// # Invariants
/// - Every component is finite and non-negative.
/// - `total` equals the sum of the four components.
#[must_use]
pub fn score(metrics: &[RawTestMetrics]) -> ScoreComponents {
    let mut components = ScoreComponents::default();
    for kind in TestKind::ORDERED {
        if let Some(entry) = metrics.iter().find(|entry| entry.kind == kind) {
            *components.component_mut(kind) = component_score(entry);
        }
    }
    components.total = components.compute
        + components.memory
        + components.storage_read
        + components.storage_write;
    components
}

/// Scores one metrics entry.
#[must_use]
pub fn component_score(metrics: &RawTestMetrics) -> f64 {
    match metrics.kind {
        TestKind::Compute => time_score(COMPUTE_REFERENCE_SECONDS, metrics.elapsed_seconds),
        TestKind::Memory => memory_score(metrics.peak_memory_bytes.unwrap_or(0)),
        TestKind::StorageRead => time_score(STORAGE_READ_REFERENCE_SECONDS, metrics.elapsed_seconds),
        TestKind::StorageWrite => {
            time_score(STORAGE_WRITE_REFERENCE_SECONDS, metrics.elapsed_seconds)
        }
    }
}

/// Scores a duration against its reference.
fn time_score(reference_seconds: f64, elapsed_seconds: f64) -> f64 {
    let elapsed = if elapsed_seconds.is_finite() {
        elapsed_seconds.max(MIN_DURATION_SECONDS)
    } else {
        MIN_DURATION_SECONDS
    };
    (reference_seconds / elapsed) * SCORE_WEIGHT
}

/// Scores peak memory against its reference.
#[allow(clippy::cast_precision_loss, reason = "Megabyte conversion tolerates rounding.")]
fn memory_score(peak_bytes: u64) -> f64 {
    let megabytes = peak_bytes.max(MIN_MEMORY_BYTES) as f64 / BYTES_PER_MEGABYTE;
    (MEMORY_REFERENCE_MEGABYTES / megabytes) * SCORE_WEIGHT
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Intensity;

    /// Metrics with a fixed elapsed time.
    fn timed(kind: TestKind, elapsed: f64) -> RawTestMetrics {
        RawTestMetrics::new(kind, Intensity::DEFAULT, elapsed)
    }

    /// Memory metrics with a fixed peak.
    fn memory(peak: u64) -> RawTestMetrics {
        let mut metrics = RawTestMetrics::new(TestKind::Memory, Intensity::DEFAULT, 0.2);
        metrics.peak_memory_bytes = Some(peak);
        metrics
    }

    /// Compares floats within a small tolerance.
    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn reference_values_score_one_weight() {
        let scores = score(&[
            timed(TestKind::Compute, 1.0),
            memory(32 * 1_048_576),
            timed(TestKind::StorageRead, 0.5),
            timed(TestKind::StorageWrite, 0.5),
        ]);
        assert!(close(scores.compute, 1000.0));
        assert!(close(scores.memory, 1000.0));
        assert!(close(scores.storage_read, 1000.0));
        assert!(close(scores.storage_write, 1000.0));
        assert!(close(scores.total, 4000.0));
    }

    #[test]
    fn zero_duration_uses_floor() {
        let scores = score(&[timed(TestKind::Compute, 0.0)]);
        assert!(close(scores.compute, 1_000_000.0));
        assert!(scores.compute.is_finite());
    }

    #[test]
    fn tiny_peak_uses_byte_floor() {
        let scores = score(&[memory(0)]);
        assert!(close(scores.memory, 32_768_000.0));
    }

    #[test]
    fn absent_tests_contribute_zero() {
        let scores = score(&[timed(TestKind::StorageRead, 0.25)]);
        assert!(close(scores.compute, 0.0));
        assert!(close(scores.memory, 0.0));
        assert!(close(scores.storage_write, 0.0));
        assert!(close(scores.storage_read, 2000.0));
        assert!(close(scores.total, 2000.0));
    }

    #[test]
    fn first_entry_per_kind_wins() {
        let scores = score(&[timed(TestKind::Compute, 1.0), timed(TestKind::Compute, 0.5)]);
        assert!(close(scores.compute, 1000.0));
    }
}
