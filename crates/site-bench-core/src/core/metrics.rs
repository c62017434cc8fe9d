// crates/site-bench-core/src/core/metrics.rs
// ============================================================================
// Module: Site Bench Metrics
// Description: Raw per-test measurements and normalized score components.
// Purpose: Carry measurements from generators to the normalizer and results.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Generators produce [`RawTestMetrics`]; the score normalizer turns a slice
//! of them into [`ScoreComponents`]. Raw values are kept as measured; display
//! helpers round for reporting only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::kinds::Intensity;
use crate::core::kinds::TestKind;

// ============================================================================
// SECTION: Raw Metrics
// ============================================================================

/// Sentinel query count used when a store cannot report queries.
pub const QUERY_COUNT_UNAVAILABLE: i64 = -1;

/// Measurements reported by one workload generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTestMetrics {
    /// Test kind that produced the metrics.
    pub kind: TestKind,
    /// Intensity the test ran at.
    pub intensity: Intensity,
    /// Elapsed wall time measured with a monotonic clock.
    pub elapsed_seconds: f64,
    /// Peak memory usage in bytes (memory test only).
    #[serde(default)]
    pub peak_memory_bytes: Option<u64>,
    /// Queries issued, or [`QUERY_COUNT_UNAVAILABLE`] (storage read only).
    #[serde(default)]
    pub query_count: Option<i64>,
    /// Total operations performed (storage write only).
    #[serde(default)]
    pub operation_count: Option<u64>,
    /// Named operation counters per internal category.
    #[serde(default)]
    pub counters: BTreeMap<String, u64>,
    /// Human-readable summary of the work performed.
    pub detail: String,
}

impl RawTestMetrics {
    /// Creates metrics with only elapsed time and detail filled in.
    #[must_use]
    pub fn new(kind: TestKind, intensity: Intensity, elapsed_seconds: f64) -> Self {
        Self {
            kind,
            intensity,
            elapsed_seconds,
            peak_memory_bytes: None,
            query_count: None,
            operation_count: None,
            counters: BTreeMap::new(),
            detail: String::new(),
        }
    }

    /// Records a named counter.
    #[must_use]
    pub fn with_counter(mut self, name: &str, value: u64) -> Self {
        self.counters.insert(name.to_string(), value);
        self
    }

    /// Sets the detail string.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// One-line summary used in the run log.
    #[must_use]
    pub fn summary(&self) -> String {
        let duration = format_seconds(self.elapsed_seconds);
        match self.kind {
            TestKind::Memory => format!(
                "Peak Usage: {}, Duration: {duration}",
                format_bytes(self.peak_memory_bytes.unwrap_or(0))
            ),
            TestKind::StorageRead => format!(
                "Queries: {}, Duration: {duration}",
                self.query_count.unwrap_or(QUERY_COUNT_UNAVAILABLE)
            ),
            TestKind::StorageWrite => {
                format!("Operations: {}, Duration: {duration}", self.operation_count.unwrap_or(0))
            }
            TestKind::Compute => format!("Duration: {duration}"),
        }
    }
}

// ============================================================================
// SECTION: Score Components
// ============================================================================

/// Weighted score per test kind plus the total.
///
/// # Invariants
/// - `total` equals the sum of the components for tests that ran.
/// - Tests that did not run contribute exactly 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Compute component.
    pub compute: f64,
    /// Memory component.
    pub memory: f64,
    /// Storage read component.
    pub storage_read: f64,
    /// Storage write component.
    pub storage_write: f64,
    /// Sum of components for tests that ran.
    pub total: f64,
}

impl ScoreComponents {
    /// Returns the component for `kind`.
    #[must_use]
    pub const fn component(&self, kind: TestKind) -> f64 {
        match kind {
            TestKind::Compute => self.compute,
            TestKind::Memory => self.memory,
            TestKind::StorageRead => self.storage_read,
            TestKind::StorageWrite => self.storage_write,
        }
    }

    /// Returns a mutable reference to the component for `kind`.
    pub fn component_mut(&mut self, kind: TestKind) -> &mut f64 {
        match kind {
            TestKind::Compute => &mut self.compute,
            TestKind::Memory => &mut self.memory,
            TestKind::StorageRead => &mut self.storage_read,
            TestKind::StorageWrite => &mut self.storage_write,
        }
    }

    /// Returns a copy with every value rounded to two decimals.
    ///
    /// The total is rounded from the raw sum, not summed from rounded parts.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            compute: round_to(self.compute, 2),
            memory: round_to(self.memory, 2),
            storage_read: round_to(self.storage_read, 2),
            storage_write: round_to(self.storage_write, 2),
            total: round_to(self.total, 2),
        }
    }
}

// ============================================================================
// SECTION: Display Helpers
// ============================================================================

/// Rounds `value` to `decimals` places, half away from zero.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Formats seconds with four decimals, e.g. `1.2345 s`.
#[must_use]
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.4} s")
}

/// Formats a byte count with binary units and two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Display formatting tolerates rounding.")]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.2} {unit}")
}
