// crates/site-bench-core/src/core/result.rs
// ============================================================================
// Module: Site Bench Results
// Description: Benchmark result record and its display projection.
// Purpose: Hand a complete, serializable run record to persistence.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`BenchmarkResult`] is produced once per completed run. Numeric fields
//! are stored raw; [`BenchmarkResult::display`] derives the rounded strings
//! shown to users. The core never persists results itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::components::ComponentSet;
use crate::core::identifiers::ProfileId;
use crate::core::identifiers::RunId;
use crate::core::kinds::TestKind;
use crate::core::metrics::RawTestMetrics;
use crate::core::metrics::ScoreComponents;
use crate::core::metrics::format_bytes;
use crate::core::metrics::format_seconds;
use crate::core::metrics::round_to;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Environment Info
// ============================================================================

/// Host and runtime metadata collected from collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Harness version string.
    pub harness_version: String,
    /// Operating system and architecture.
    pub platform: String,
    /// Additional collaborator-supplied versions (store engine, runtime).
    #[serde(default)]
    pub details: BTreeMap<String, String>,
    /// System load average before the run, when available.
    #[serde(default)]
    pub load_average_before: Option<String>,
    /// System load average after the run, when available.
    #[serde(default)]
    pub load_average_after: Option<String>,
}

// ============================================================================
// SECTION: Benchmark Result
// ============================================================================

/// Complete record of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Run identifier.
    pub run_id: RunId,
    /// Wall-clock start of the measurement phase.
    pub start_timestamp: Timestamp,
    /// Wall-clock end of the measurement phase.
    pub end_timestamp: Timestamp,
    /// Monotonic duration of the measurement phase in seconds.
    pub total_duration_seconds: f64,
    /// Metrics per test, in execution order.
    pub per_test: Vec<RawTestMetrics>,
    /// Raw score components.
    pub raw_scores: ScoreComponents,
    /// Score components rounded to two decimals for reporting.
    pub scores: ScoreComponents,
    /// Active components before the run.
    pub environment_before: ComponentSet,
    /// Components the caller requested active.
    pub environment_user_requested: ComponentSet,
    /// Active components after restoration.
    pub environment_after: ComponentSet,
    /// Host and runtime metadata.
    pub environment_info: EnvironmentInfo,
    /// Profile the request was resolved from.
    #[serde(default)]
    pub profile_id: Option<ProfileId>,
    /// Ordered progress and diagnostic messages.
    pub log: Vec<String>,
}

impl BenchmarkResult {
    /// Returns metrics for `kind` when that test ran.
    #[must_use]
    pub fn metrics_for(&self, kind: TestKind) -> Option<&RawTestMetrics> {
        self.per_test.iter().find(|metrics| metrics.kind == kind)
    }

    /// Title used when persisting the result.
    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "Benchmark - {} (Score: {})",
            self.start_timestamp.to_rfc3339(),
            round_to(self.raw_scores.total, 0)
        )
    }

    /// Builds the rounded display projection.
    #[must_use]
    pub fn display(&self) -> ResultDisplay {
        ResultDisplay {
            total_duration: format_seconds(self.total_duration_seconds),
            score_total: format!("{:.2}", self.scores.total),
            tests: self
                .per_test
                .iter()
                .map(|metrics| TestDisplay {
                    kind: metrics.kind,
                    intensity: metrics.intensity.to_string(),
                    duration: format_seconds(metrics.elapsed_seconds),
                    score: format!("{:.2}", self.scores.component(metrics.kind)),
                    peak_memory: metrics.peak_memory_bytes.map(format_bytes),
                    detail: metrics.detail.clone(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// SECTION: Display Projection
// ============================================================================

/// Rounded, human-readable form of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultDisplay {
    /// Total duration, e.g. `1.2345 s`.
    pub total_duration: String,
    /// Total score with two decimals.
    pub score_total: String,
    /// Per-test display rows.
    pub tests: Vec<TestDisplay>,
}

/// Rounded, human-readable form of one test's metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDisplay {
    /// Test kind.
    pub kind: TestKind,
    /// Intensity with a percent suffix.
    pub intensity: String,
    /// Duration with four decimals.
    pub duration: String,
    /// Score component with two decimals.
    pub score: String,
    /// Peak memory with binary units (memory test only).
    pub peak_memory: Option<String>,
    /// Generator detail string.
    pub detail: String,
}
