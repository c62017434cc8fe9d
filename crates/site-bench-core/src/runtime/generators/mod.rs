// crates/site-bench-core/src/runtime/generators/mod.rs
// ============================================================================
// Module: Site Bench Workload Generators
// Description: Generator trait, shared error type, and base iteration counts.
// Purpose: Give every workload the same run contract and scaling inputs.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Each generator runs one fixed category of synthetic work scaled by an
//! [`Intensity`] and reports [`RawTestMetrics`]. Generators time themselves
//! with a monotonic clock and never run concurrently with one another.
//! [`WorkloadBase`] holds the base iteration counts each generator scales.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod compute;
pub mod memory;
pub mod storage_read;
pub mod storage_write;

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::Intensity;
use crate::core::RawTestMetrics;
use crate::core::TestKind;
use crate::interfaces::StorageError;

pub use compute::ComputeGenerator;
pub use memory::MemoryGenerator;
pub use storage_read::StorageReadGenerator;
pub use storage_write::StorageWriteGenerator;

// ============================================================================
// SECTION: Contract
// ============================================================================

/// Failure of a workload's backing resource.
///
/// Carries the partial detail string describing work done before the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} generator failed: {reason}")]
pub struct GeneratorError {
    /// Test kind that failed.
    pub kind: TestKind,
    /// Failure reason.
    pub reason: String,
    /// Partial detail describing completed work.
    pub detail: String,
}

impl GeneratorError {
    /// Wraps a storage error for `kind` with the partial detail so far.
    #[must_use]
    pub fn storage(kind: TestKind, error: &StorageError, detail: String) -> Self {
        Self {
            kind,
            reason: error.to_string(),
            detail,
        }
    }
}

/// One category of synthetic, intensity-scaled work.
pub trait WorkloadGenerator {
    /// Test kind this generator implements.
    fn kind(&self) -> TestKind;

    /// Runs the workload at `intensity` and reports its metrics.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] when the backing resource is unavailable.
    fn run(&self, intensity: Intensity) -> Result<RawTestMetrics, GeneratorError>;
}

// ============================================================================
// SECTION: Base Iterations
// ============================================================================

/// Base iteration counts for every generator, scaled by intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadBase {
    /// Compute base counts.
    pub compute: ComputeBase,
    /// Memory base counts.
    pub memory: MemoryBase,
    /// Storage read base counts.
    pub storage_read: StorageReadBase,
    /// Storage write base counts.
    pub storage_write: StorageWriteBase,
}

/// Base counts for the compute workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComputeBase {
    /// Floating point sqrt/sin/log loop iterations.
    pub math_iterations: u64,
    /// Random-byte buffers generated and hashed.
    pub hash_count: u64,
    /// String search/replace operations over the template.
    pub string_operations: u64,
    /// Integers generated and sorted.
    pub sort_array_size: u64,
    /// Repetitions of the iterative Fibonacci computation.
    pub fibonacci_repeats: u64,
}

impl Default for ComputeBase {
    fn default() -> Self {
        Self {
            math_iterations: 2_000_000,
            hash_count: 2_000,
            string_operations: 20_000,
            sort_array_size: 100_000,
            fibonacci_repeats: 10_000,
        }
    }
}

/// Base counts for the memory workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryBase {
    /// Number of 1 KiB strings allocated.
    pub element_count: u64,
}

impl Default for MemoryBase {
    fn default() -> Self {
        Self {
            element_count: 25_000,
        }
    }
}

/// Base counts for the storage read workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageReadBase {
    /// Point lookups against the largest ids.
    pub point_lookups: u64,
    /// Reads of the well-known configuration key.
    pub option_reads: u64,
    /// Page size of the filtered scan.
    pub scan_size: u64,
}

impl Default for StorageReadBase {
    fn default() -> Self {
        Self {
            point_lookups: 250,
            option_reads: 250,
            scan_size: 100,
        }
    }
}

/// Base counts for the storage write workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageWriteBase {
    /// Option create/update/delete round trips.
    pub option_round_trips: u64,
    /// Rows bulk-inserted into the scratch table.
    pub table_rows: u64,
}

impl Default for StorageWriteBase {
    fn default() -> Self {
        Self {
            option_round_trips: 100,
            table_rows: 200,
        }
    }
}

impl WorkloadBase {
    /// Returns every base count with its dotted name.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, u64); 11] {
        [
            ("compute.math_iterations", self.compute.math_iterations),
            ("compute.hash_count", self.compute.hash_count),
            ("compute.string_operations", self.compute.string_operations),
            ("compute.sort_array_size", self.compute.sort_array_size),
            ("compute.fibonacci_repeats", self.compute.fibonacci_repeats),
            ("memory.element_count", self.memory.element_count),
            ("storage_read.point_lookups", self.storage_read.point_lookups),
            ("storage_read.option_reads", self.storage_read.option_reads),
            ("storage_read.scan_size", self.storage_read.scan_size),
            ("storage_write.option_round_trips", self.storage_write.option_round_trips),
            ("storage_write.table_rows", self.storage_write.table_rows),
        ]
    }
}
