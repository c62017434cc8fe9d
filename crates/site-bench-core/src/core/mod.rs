// crates/site-bench-core/src/core/mod.rs
// ============================================================================
// Module: Site Bench Core Types
// Description: Canonical request, environment, metric, and result types.
// Purpose: Provide stable, serializable types shared by every crate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types define benchmark requests, component sets and their diffs,
//! per-test measurements, score components, and the result record. These are
//! the canonical source of truth for the CLI and any persistence layer.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod components;
pub mod identifiers;
pub mod kinds;
pub mod metrics;
pub mod request;
pub mod result;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use components::ComponentSet;
pub use components::EnvironmentDiff;
pub use components::PendingRestoreRecord;
pub use identifiers::ComponentId;
pub use identifiers::MAX_COMPONENT_ID_LENGTH;
pub use identifiers::ProfileId;
pub use identifiers::RunId;
pub use kinds::Intensity;
pub use kinds::TestKind;
pub use metrics::QUERY_COUNT_UNAVAILABLE;
pub use metrics::RawTestMetrics;
pub use metrics::ScoreComponents;
pub use metrics::format_bytes;
pub use metrics::format_seconds;
pub use metrics::round_to;
pub use request::BenchmarkProfile;
pub use request::BenchmarkRequest;
pub use request::MAX_REQUEST_COMPONENTS;
pub use request::RawBenchmarkRequest;
pub use request::ValidationError;
pub use result::BenchmarkResult;
pub use result::EnvironmentInfo;
pub use result::ResultDisplay;
pub use result::TestDisplay;
pub use time::Timestamp;
