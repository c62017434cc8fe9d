// crates/site-bench-core/src/runtime/mod.rs
// ============================================================================
// Module: Site Bench Runtime
// Description: Scaler, generators, normalizer, environment, and orchestrator.
// Purpose: Execute benchmark runs against backend-agnostic collaborators.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the benchmark pipeline: intensity scaling, the
//! four workload generators, score normalization, environment control with a
//! durable restore record, the run lease, and the orchestrator that sequences
//! them. Every caller goes through the same orchestrator.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod environment;
pub mod generators;
pub mod host;
pub mod intensity;
pub mod lease;
pub mod orchestrator;
pub mod score;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::BenchAuditEvent;
pub use audit::BenchAuditSink;
pub use audit::FileAuditSink;
pub use audit::LogLevel;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RunLog;
pub use audit::StderrAuditSink;
pub use environment::EnvironmentController;
pub use environment::EnvironmentState;
pub use environment::PENDING_RESTORE_KEY;
pub use environment::read_pending_record;
pub use environment::restore_pending;
pub use generators::ComputeBase;
pub use generators::ComputeGenerator;
pub use generators::GeneratorError;
pub use generators::MemoryBase;
pub use generators::MemoryGenerator;
pub use generators::StorageReadBase;
pub use generators::StorageReadGenerator;
pub use generators::StorageWriteBase;
pub use generators::StorageWriteGenerator;
pub use generators::WorkloadBase;
pub use generators::WorkloadGenerator;
pub use generators::storage_read::WELL_KNOWN_OPTION_KEY;
pub use generators::storage_write::SCRATCH_OPTION_PREFIX;
pub use host::HostEnvironmentProbe;
pub use host::ProcStatusMemoryProbe;
pub use host::SystemClock;
pub use intensity::scale;
pub use lease::CancelFlag;
pub use lease::RunGuard;
pub use lease::RunLock;
pub use orchestrator::BenchmarkError;
pub use orchestrator::BenchmarkFailure;
pub use orchestrator::BenchmarkOrchestrator;
pub use orchestrator::DEFAULT_SELF_COMPONENT;
pub use orchestrator::OrchestratorConfig;
pub use orchestrator::PersistedRun;
pub use orchestrator::RestoreReport;
pub use score::score;
pub use store::InMemoryComponentRegistry;
pub use store::InMemoryRecordStore;
pub use store::InMemoryResultSink;
pub use store::InMemoryStorage;
