// crates/site-bench-core/src/lib.rs
// ============================================================================
// Module: Site Bench Core Library
// Description: Public API surface for the site benchmark harness core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Site Bench core measures a site's compute, memory, and storage performance
//! under a temporarily reconfigured set of active components, scores the
//! measurements against fixed references, and always restores the original
//! component set. It reaches the registry, storage, and persistence only
//! through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::ComponentError;
pub use interfaces::ComponentRegistry;
pub use interfaces::DurableRecordStore;
pub use interfaces::EnvironmentProbe;
pub use interfaces::MemoryProbe;
pub use interfaces::OptionStore;
pub use interfaces::PersistenceError;
pub use interfaces::ProfileResolver;
pub use interfaces::ReferenceTable;
pub use interfaces::ResultRef;
pub use interfaces::ResultSink;
pub use interfaces::ScratchTable;
pub use interfaces::StorageError;
pub use interfaces::StoreError;
pub use interfaces::ensure_scratch_table;
pub use runtime::BenchAuditEvent;
pub use runtime::BenchAuditSink;
pub use runtime::BenchmarkError;
pub use runtime::BenchmarkFailure;
pub use runtime::BenchmarkOrchestrator;
pub use runtime::CancelFlag;
pub use runtime::ComputeBase;
pub use runtime::DEFAULT_SELF_COMPONENT;
pub use runtime::EnvironmentController;
pub use runtime::EnvironmentState;
pub use runtime::FileAuditSink;
pub use runtime::GeneratorError;
pub use runtime::HostEnvironmentProbe;
pub use runtime::InMemoryComponentRegistry;
pub use runtime::InMemoryRecordStore;
pub use runtime::InMemoryResultSink;
pub use runtime::InMemoryStorage;
pub use runtime::LogLevel;
pub use runtime::MemoryAuditSink;
pub use runtime::MemoryBase;
pub use runtime::NoopAuditSink;
pub use runtime::OrchestratorConfig;
pub use runtime::PENDING_RESTORE_KEY;
pub use runtime::PersistedRun;
pub use runtime::ProcStatusMemoryProbe;
pub use runtime::RestoreReport;
pub use runtime::RunGuard;
pub use runtime::RunLock;
pub use runtime::RunLog;
pub use runtime::StderrAuditSink;
pub use runtime::StorageReadBase;
pub use runtime::StorageWriteBase;
pub use runtime::SystemClock;
pub use runtime::WorkloadBase;
pub use runtime::WorkloadGenerator;
pub use runtime::scale;
pub use runtime::score;
