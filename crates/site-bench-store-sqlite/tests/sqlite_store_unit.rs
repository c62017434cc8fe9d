// crates/site-bench-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Bench Store Unit Tests
// Description: Targeted tests for the SQLite storage collaborators.
// Purpose: Validate path safety, schema versioning, durable records, component
//          state, workload tables, result persistence, and a full run.
// ============================================================================

//! ## Overview
//! Unit-level tests for the `SQLite` bench store:
//! - Path safety checks and schema version validation
//! - Durable record round trips that survive reopening
//! - Component activation, deactivation, and install checks
//! - Workload tables, query counting, and the scratch table guard
//! - Result persistence and corruption detection
//! - An orchestrated run that restores the component set on disk

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;
use rusqlite::params;
use site_bench_core::BenchmarkOrchestrator;
use site_bench_core::BenchmarkRequest;
use site_bench_core::ComponentError;
use site_bench_core::ComponentId;
use site_bench_core::ComponentRegistry;
use site_bench_core::ComponentSet;
use site_bench_core::DurableRecordStore;
use site_bench_core::Intensity;
use site_bench_core::NoopAuditSink;
use site_bench_core::OptionStore;
use site_bench_core::OrchestratorConfig;
use site_bench_core::PENDING_RESTORE_KEY;
use site_bench_core::ReferenceTable;
use site_bench_core::ResultSink;
use site_bench_core::ScratchTable;
use site_bench_core::StorageReadBase;
use site_bench_core::StorageWriteBase;
use site_bench_core::TestKind;
use site_bench_core::WorkloadBase;
use site_bench_core::ensure_scratch_table;
use site_bench_store_sqlite::SqliteBenchStore;
use site_bench_store_sqlite::SqliteJournalMode;
use site_bench_store_sqlite::SqliteStoreConfig;
use site_bench_store_sqlite::SqliteStoreError;
use site_bench_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("bench.sqlite")
}

fn open(dir: &TempDir) -> SqliteBenchStore {
    SqliteBenchStore::new(SqliteStoreConfig {
        path: store_path(dir),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteJournalMode::Wal,
        sync_mode: SqliteSyncMode::Normal,
    })
    .unwrap()
}

fn id(raw: &str) -> ComponentId {
    ComponentId::new(raw)
}

fn set(ids: &[&str]) -> ComponentSet {
    ids.iter().map(|raw| id(raw)).collect()
}

// ============================================================================
// SECTION: Paths and Schema
// ============================================================================

#[test]
fn rejects_directory_path() {
    let dir = TempDir::new().unwrap();
    let err = SqliteBenchStore::new(SqliteStoreConfig::at(dir.path())).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn rejects_overlong_component() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a".repeat(300));
    let err = SqliteBenchStore::new(SqliteStoreConfig::at(path)).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("bench.sqlite");
    SqliteBenchStore::new(SqliteStoreConfig::at(&path)).unwrap();
    assert!(path.exists());
}

#[test]
fn rejects_unknown_schema_version() {
    let dir = TempDir::new().unwrap();
    drop(open(&dir));
    let connection = Connection::open(store_path(&dir)).unwrap();
    connection.execute("UPDATE store_meta SET version = ?1", params![99]).unwrap();
    drop(connection);
    let err = SqliteBenchStore::new(SqliteStoreConfig::at(store_path(&dir))).unwrap_err();
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
}

// ============================================================================
// SECTION: Durable Records
// ============================================================================

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.set(PENDING_RESTORE_KEY, "{\"a\":1}").unwrap();
    store.set(PENDING_RESTORE_KEY, "{\"a\":2}").unwrap();
    drop(store);

    let reopened = open(&dir);
    assert_eq!(reopened.get(PENDING_RESTORE_KEY).unwrap().as_deref(), Some("{\"a\":2}"));
    reopened.delete(PENDING_RESTORE_KEY).unwrap();
    assert_eq!(reopened.get(PENDING_RESTORE_KEY).unwrap(), None);
}

// ============================================================================
// SECTION: Component Registry
// ============================================================================

#[test]
fn registry_tracks_active_components() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.register_component(&id("cache"), true).unwrap();
    store.register_component(&id("seo"), false).unwrap();
    store.register_component(&id("site-bench"), true).unwrap();

    assert_eq!(store.list_active().unwrap(), set(&["cache", "site-bench"]));
    store.activate(&id("seo")).unwrap();
    store.deactivate(&set(&["cache"])).unwrap();
    assert_eq!(store.list_active().unwrap(), set(&["seo", "site-bench"]));
    assert!(store.is_installed(&id("cache")).unwrap());
    assert!(!store.is_installed(&id("missing")).unwrap());
}

#[test]
fn activating_unknown_component_fails() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let err = store.activate(&id("ghost")).unwrap_err();
    assert_eq!(err, ComponentError::NotInstalled("ghost".to_string()));
}

#[test]
fn unregister_removes_component() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.register_component(&id("cache"), true).unwrap();
    assert!(store.unregister_component(&id("cache")).unwrap());
    assert!(!store.unregister_component(&id("cache")).unwrap());
    assert!(store.installed_components().unwrap().is_empty());
}

// ============================================================================
// SECTION: Workload Tables
// ============================================================================

#[test]
fn seeded_rows_serve_reads_and_count_queries() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    assert_eq!(store.seed_reference_rows(10).unwrap(), 10);
    assert_eq!(store.seed_reference_rows(5).unwrap(), 5);
    assert_eq!(store.reference_row_count().unwrap(), 15);

    let before = store.query_count().unwrap();
    assert_eq!(store.largest_ids(3).unwrap(), vec![15, 14, 13]);
    assert_eq!(store.title_by_id(14).unwrap().as_deref(), Some("Reference row 14"));
    assert_eq!(store.title_by_id(99).unwrap(), None);
    assert_eq!(store.scan(4).unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(store.query_count().unwrap() - before, 4);
}

#[test]
fn option_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.create_option("site_name", "Example").unwrap();
    store.create_option("site_name", "Ignored").unwrap();
    assert_eq!(store.get_option("site_name").unwrap().as_deref(), Some("Example"));
    store.update_option("site_name", "Renamed").unwrap();
    assert_eq!(store.get_option("site_name").unwrap().as_deref(), Some("Renamed"));
    store.delete_option("site_name").unwrap();
    assert_eq!(store.get_option("site_name").unwrap(), None);
}

#[test]
fn scratch_table_guard_creates_once() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    assert!(!store.scratch_table_exists().unwrap());
    assert!(store.insert_scratch_row("before").is_err());
    assert!(ensure_scratch_table(&store).unwrap());
    assert!(!ensure_scratch_table(&store).unwrap());
    store.insert_scratch_row("row").unwrap();
    store.truncate_scratch_table().unwrap();
    drop(store);

    let reopened = open(&dir);
    assert!(reopened.scratch_table_exists().unwrap());
}

// ============================================================================
// SECTION: Results
// ============================================================================

fn tiny_workloads() -> WorkloadBase {
    let mut workloads = WorkloadBase::default();
    workloads.compute.math_iterations = 1_000;
    workloads.compute.hash_count = 4;
    workloads.compute.string_operations = 10;
    workloads.compute.sort_array_size = 100;
    workloads.compute.fibonacci_repeats = 2;
    workloads.memory.element_count = 16;
    workloads.storage_read = StorageReadBase {
        point_lookups: 5,
        option_reads: 5,
        scan_size: 5,
    };
    workloads.storage_write = StorageWriteBase {
        option_round_trips: 4,
        table_rows: 8,
    };
    workloads
}

#[test]
fn orchestrated_run_restores_and_persists() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store.seed_reference_rows(20).unwrap();
    store.create_option("site_name", "Example").unwrap();
    for (component, active) in [("site-bench", true), ("cache", true), ("seo", false)] {
        store.register_component(&id(component), active).unwrap();
    }
    let before = store.list_active().unwrap();

    let config = OrchestratorConfig {
        workloads: tiny_workloads(),
        ..OrchestratorConfig::default()
    };
    let orchestrator =
        BenchmarkOrchestrator::new(store.clone(), store.clone(), store.clone(), config)
            .with_audit_sink(Arc::new(NoopAuditSink));
    let mut request = BenchmarkRequest::new(
        [TestKind::Compute, TestKind::StorageRead, TestKind::StorageWrite],
        set(&["seo"]),
    )
    .unwrap();
    for kind in [TestKind::Compute, TestKind::StorageRead, TestKind::StorageWrite] {
        request = request.with_intensity(kind, Intensity::MAX);
    }

    let persisted = orchestrator.run_and_persist(&request, &store).unwrap();
    assert_eq!(store.list_active().unwrap(), before);
    assert_eq!(persisted.result.environment_after, before);
    assert_eq!(store.get(PENDING_RESTORE_KEY).unwrap(), None);
    assert_eq!(store.get_option("site_name").unwrap().as_deref(), Some("Example"));

    let read = persisted.result.metrics_for(TestKind::StorageRead).unwrap();
    assert!(read.query_count.unwrap() > 0);

    let loaded = store.load_result(&persisted.result.run_id).unwrap().unwrap();
    assert_eq!(loaded.result.run_id, persisted.result.run_id);
    assert_eq!(loaded.result.per_test.len(), 3);
    assert_eq!(loaded.result.environment_before, before);
    assert_eq!(loaded.title, persisted.reference.title);
    let listed = store.list_results(10).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].0, persisted.result.run_id);
}

#[test]
fn corrupt_result_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let orchestrator = BenchmarkOrchestrator::new(
        store.clone(),
        store.clone(),
        store.clone(),
        OrchestratorConfig {
            workloads: tiny_workloads(),
            ..OrchestratorConfig::default()
        },
    )
    .with_audit_sink(Arc::new(NoopAuditSink));
    let request = BenchmarkRequest::new([TestKind::Compute], ComponentSet::new()).unwrap();
    let result = orchestrator.run_benchmark(&request).unwrap();
    store.persist(&result).unwrap();
    drop(store);

    let connection = Connection::open(store_path(&dir)).unwrap();
    connection
        .execute(
            "UPDATE bench_results SET result_json = ?1 WHERE run_id = ?2",
            params!["{not json", result.run_id.as_str()],
        )
        .unwrap();
    drop(connection);

    let reopened = open(&dir);
    let err = reopened.load_result(&result.run_id).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Corrupt(_)));
}
