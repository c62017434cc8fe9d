// crates/site-bench-core/src/core/kinds.rs
// ============================================================================
// Module: Site Bench Test Kinds
// Description: Closed set of workload kinds and the intensity knob.
// Purpose: Replace string-keyed test dispatch with a typed enum.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`TestKind`] names the four workload categories. [`TestKind::ORDERED`] is
//! the fixed execution order used by the orchestrator. [`Intensity`] is the
//! 0-100 scaling knob; construction always clamps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::request::ValidationError;

// ============================================================================
// SECTION: Test Kind
// ============================================================================

/// Workload category selectable in a benchmark request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Floating point, hashing, string, sort, and Fibonacci work.
    Compute,
    /// Allocation of many fixed-size strings.
    Memory,
    /// Point lookups, hot key reads, and a filtered scan.
    StorageRead,
    /// Option round trips and scratch table bulk inserts.
    StorageWrite,
}

impl TestKind {
    /// Fixed execution order for orchestrated runs.
    pub const ORDERED: [Self; 4] = [Self::Compute, Self::Memory, Self::StorageRead, Self::StorageWrite];

    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Memory => "memory",
            Self::StorageRead => "storage_read",
            Self::StorageWrite => "storage_write",
        }
    }

    /// Returns a human-readable name used in run logs.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Compute => "Compute",
            Self::Memory => "Memory",
            Self::StorageRead => "Storage Read",
            Self::StorageWrite => "Storage Write",
        }
    }

    /// Parses a label, accepting the legacy `cpu`, `db_read`, and `db_write` aliases.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "compute" | "cpu" => Some(Self::Compute),
            "memory" => Some(Self::Memory),
            "storage_read" | "db_read" => Some(Self::StorageRead),
            "storage_write" | "db_write" => Some(Self::StorageWrite),
            _ => None,
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_label(value).ok_or_else(|| ValidationError::UnknownTestKind(value.to_string()))
    }
}

// ============================================================================
// SECTION: Intensity
// ============================================================================

/// Workload intensity in percent.
///
/// # Invariants
/// - The wrapped value is always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Intensity(u8);

impl Intensity {
    /// Lowest intensity.
    pub const MIN: Self = Self(0);
    /// Highest intensity.
    pub const MAX: Self = Self(100);
    /// Intensity used when a selected test has none.
    pub const DEFAULT: Self = Self(50);

    /// Creates an intensity, clamping the input into `0..=100`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let bounded = value.clamp(0, 100);
        Self(u8::try_from(bounded).unwrap_or(100))
    }

    /// Returns the intensity as a percentage value.
    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for Intensity {
    fn from(value: i64) -> Self {
        Self::clamped(value)
    }
}

impl From<Intensity> for i64 {
    fn from(value: Intensity) -> Self {
        Self::from(value.0)
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
