// crates/site-bench-core/tests/storage_generators.rs
// ============================================================================
// Module: Storage Workload Tests
// Description: Tests for the storage read and write generators.
// Purpose: Validate operation counts, cleanup, and partial failure details.
// Dependencies: site-bench-core
// ============================================================================

//! ## Overview
//! Runs the storage generators against in-memory storage and checks query
//! counting, scratch key cleanup, the ensure-schema step, and the partial
//! detail carried by a failure.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use site_bench_core::InMemoryStorage;
use site_bench_core::Intensity;
use site_bench_core::OptionStore;
use site_bench_core::QUERY_COUNT_UNAVAILABLE;
use site_bench_core::ReferenceTable;
use site_bench_core::StorageError;
use site_bench_core::StorageReadBase;
use site_bench_core::StorageWriteBase;
use site_bench_core::TestKind;
use site_bench_core::WorkloadGenerator;
use site_bench_core::runtime::StorageReadGenerator;
use site_bench_core::runtime::StorageWriteGenerator;
use site_bench_core::runtime::WELL_KNOWN_OPTION_KEY;

/// Storage that serves reads but cannot report a query count.
struct UncountedStorage(InMemoryStorage);

impl ReferenceTable for UncountedStorage {
    fn largest_ids(&self, limit: u64) -> Result<Vec<i64>, StorageError> {
        self.0.largest_ids(limit)
    }

    fn title_by_id(&self, id: i64) -> Result<Option<String>, StorageError> {
        self.0.title_by_id(id)
    }

    fn scan(&self, limit: u64) -> Result<Vec<i64>, StorageError> {
        self.0.scan(limit)
    }
}

impl OptionStore for UncountedStorage {
    fn get_option(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get_option(key)
    }

    fn create_option(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.create_option(key, value)
    }

    fn update_option(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.update_option(key, value)
    }

    fn delete_option(&self, key: &str) -> Result<(), StorageError> {
        self.0.delete_option(key)
    }
}

// ============================================================================
// SECTION: Storage Read
// ============================================================================

#[test]
fn read_counts_every_query() {
    let storage = InMemoryStorage::with_reference_rows(50);
    storage.put_option(WELL_KNOWN_OPTION_KEY, "Example Site");
    let generator = StorageReadGenerator::new(StorageReadBase::default(), &storage);
    let metrics = generator.run(Intensity::clamped(10)).unwrap();

    assert_eq!(metrics.kind, TestKind::StorageRead);
    // 1 largest-ids query, 25 lookups, 25 option reads, 1 scan.
    assert_eq!(metrics.query_count, Some(52));
    assert_eq!(metrics.counters["rows_found"], 25);
    assert_eq!(metrics.counters["rows_scanned"], 10);
    assert!(metrics.detail.contains("(25 hits)"));
}

#[test]
fn read_reports_sentinel_without_query_counter() {
    let storage = UncountedStorage(InMemoryStorage::with_reference_rows(5));
    let generator = StorageReadGenerator::new(StorageReadBase::default(), &storage);
    let metrics = generator.run(Intensity::MIN).unwrap();
    assert_eq!(metrics.query_count, Some(QUERY_COUNT_UNAVAILABLE));
}

#[test]
fn read_on_empty_table_still_succeeds() {
    let storage = InMemoryStorage::new();
    let generator = StorageReadGenerator::new(StorageReadBase::default(), &storage);
    let metrics = generator.run(Intensity::DEFAULT).unwrap();
    assert_eq!(metrics.counters["point_lookups"], 0);
    assert_eq!(metrics.counters["option_reads"], 125);
}

#[test]
fn read_failure_carries_partial_detail() {
    let storage = InMemoryStorage::with_reference_rows(5);
    storage.set_unavailable(true);
    let generator = StorageReadGenerator::new(StorageReadBase::default(), &storage);
    let err = generator.run(Intensity::DEFAULT).unwrap_err();
    assert_eq!(err.kind, TestKind::StorageRead);
    assert!(err.reason.contains("storage offline"));
    assert!(err.detail.starts_with("Looked up 0 rows"));
}

// ============================================================================
// SECTION: Storage Write
// ============================================================================

#[test]
fn write_cleans_up_and_counts_operations() {
    let storage = InMemoryStorage::new();
    storage.put_option("site_name", "Example Site");
    let generator = StorageWriteGenerator::new(StorageWriteBase::default(), &storage);
    let metrics = generator.run(Intensity::DEFAULT).unwrap();

    assert_eq!(metrics.operation_count, Some(3 * 50 + 100));
    assert_eq!(storage.option_keys(), vec!["site_name".to_string()]);
    assert_eq!(storage.scratch_rows(), Some(0));
    assert!(metrics.detail.contains("(scratch table created)"));
}

#[test]
fn scratch_table_is_created_once() {
    let storage = InMemoryStorage::new();
    let generator = StorageWriteGenerator::new(StorageWriteBase::default(), &storage);
    generator.run(Intensity::MIN).unwrap();
    let second = generator.run(Intensity::MIN).unwrap();
    assert_eq!(storage.scratch_creates(), 1);
    assert!(!second.detail.contains("scratch table created"));
}

#[test]
fn write_failure_reports_kind() {
    let storage = InMemoryStorage::new();
    storage.set_unavailable(true);
    let generator = StorageWriteGenerator::new(StorageWriteBase::default(), &storage);
    let err = generator.run(Intensity::MAX).unwrap_err();
    assert_eq!(err.kind, TestKind::StorageWrite);
    assert!(err.detail.starts_with("Performed 0 option creates"));
}
