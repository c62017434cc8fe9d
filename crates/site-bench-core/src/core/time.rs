// crates/site-bench-core/src/core/time.rs
// ============================================================================
// Module: Site Bench Time Model
// Description: Wall-clock timestamps recorded in benchmark results.
// Purpose: Keep result timestamps explicit and serializable.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Result timestamps are unix milliseconds supplied by a
//! [`Clock`](crate::interfaces::Clock). Elapsed durations are measured
//! separately with a monotonic clock and never derived from these values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Wall-clock timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - No monotonicity is implied; durations come from a monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp as fractional unix seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "Millisecond epochs fit in f64 mantissa.")]
    pub fn as_unix_seconds(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Formats the timestamp as RFC 3339 in UTC.
    ///
    /// Falls back to the raw millisecond value when the timestamp is out of
    /// the representable calendar range.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        let nanos = i128::from(self.0) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|value| value.format(&Rfc3339).ok())
            .unwrap_or_else(|| format!("{}ms", self.0))
    }
}
