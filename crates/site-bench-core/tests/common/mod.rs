// crates/site-bench-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared collaborators and helpers for core integration tests.
// Purpose: Build fast, deterministic orchestrators over in-memory stores.
// Dependencies: site-bench-core
// ============================================================================

//! ## Overview
//! Provides tiny workload bases, a fixed clock, a silent memory probe, and an
//! orchestrator constructor wired to in-memory collaborators whose clones
//! stay inspectable after a run.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use site_bench_core::BenchmarkOrchestrator;
use site_bench_core::BenchmarkRequest;
use site_bench_core::Clock;
use site_bench_core::ComponentId;
use site_bench_core::ComponentSet;
use site_bench_core::ComputeBase;
use site_bench_core::InMemoryComponentRegistry;
use site_bench_core::InMemoryRecordStore;
use site_bench_core::InMemoryStorage;
use site_bench_core::Intensity;
use site_bench_core::MemoryAuditSink;
use site_bench_core::MemoryBase;
use site_bench_core::MemoryProbe;
use site_bench_core::OrchestratorConfig;
use site_bench_core::StorageReadBase;
use site_bench_core::StorageWriteBase;
use site_bench_core::TestKind;
use site_bench_core::Timestamp;
use site_bench_core::WorkloadBase;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Orchestrator type used across tests.
pub type TestOrchestrator =
    BenchmarkOrchestrator<InMemoryComponentRegistry, InMemoryRecordStore, InMemoryStorage>;

/// Clock that always reports the same instant.
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.0)
    }
}

/// Memory probe that never reports a reading.
pub struct SilentMemoryProbe;

impl MemoryProbe for SilentMemoryProbe {
    fn current_bytes(&self) -> Option<u64> {
        None
    }
}

/// In-memory collaborators shared with the orchestrator.
pub struct Fixture {
    /// Component registry.
    pub registry: InMemoryComponentRegistry,
    /// Durable record store.
    pub records: InMemoryRecordStore,
    /// Workload storage.
    pub storage: InMemoryStorage,
    /// Captured audit events.
    pub audit: Arc<MemoryAuditSink>,
}

impl Fixture {
    /// Creates collaborators with the given installed and active components.
    pub fn new(installed: &[&str], active: &[&str]) -> Self {
        Self {
            registry: InMemoryComponentRegistry::with_components(
                installed.iter().copied(),
                active.iter().copied(),
            ),
            records: InMemoryRecordStore::new(),
            storage: InMemoryStorage::with_reference_rows(20),
            audit: Arc::new(MemoryAuditSink::new()),
        }
    }

    /// Builds an orchestrator over clones of the collaborators.
    pub fn orchestrator(&self) -> TestOrchestrator {
        let config = OrchestratorConfig {
            workloads: tiny_workloads(),
            ..OrchestratorConfig::default()
        };
        BenchmarkOrchestrator::new(
            self.registry.clone(),
            self.records.clone(),
            self.storage.clone(),
            config,
        )
        .with_clock(FixedClock(1_700_000_000_000))
        .with_memory_probe(SilentMemoryProbe)
        .with_audit_sink(self.audit.clone())
    }
}

/// Base counts small enough for every test to finish quickly.
pub fn tiny_workloads() -> WorkloadBase {
    WorkloadBase {
        compute: ComputeBase {
            math_iterations: 1_000,
            hash_count: 4,
            string_operations: 10,
            sort_array_size: 100,
            fibonacci_repeats: 4,
        },
        memory: MemoryBase { element_count: 16 },
        storage_read: StorageReadBase {
            point_lookups: 5,
            option_reads: 5,
            scan_size: 5,
        },
        storage_write: StorageWriteBase {
            option_round_trips: 4,
            table_rows: 8,
        },
    }
}

/// Builds a component set from string identifiers.
pub fn set(ids: &[&str]) -> ComponentSet {
    ids.iter().map(|id| ComponentId::new(*id)).collect()
}

/// Builds a request for `tests` at full intensity with `components` active.
pub fn request(tests: &[TestKind], components: &[&str]) -> BenchmarkRequest {
    let mut request = BenchmarkRequest::new(tests.iter().copied(), set(components)).unwrap();
    for kind in tests {
        request = request.with_intensity(*kind, Intensity::MAX);
    }
    request
}
