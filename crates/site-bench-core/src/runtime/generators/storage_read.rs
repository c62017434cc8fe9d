// crates/site-bench-core/src/runtime/generators/storage_read.rs
// ============================================================================
// Module: Site Bench Storage Read Workload
// Description: Point lookups, hot key reads, and a filtered scan.
// Purpose: Measure read latency of the site's backing store.
// Dependencies: crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The read workload looks up the largest reference rows by id, reads one
//! well-known option key repeatedly, then runs a paginated scan. The query
//! count is the store's counter delta, or the unavailable sentinel when the
//! store does not track queries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use crate::core::Intensity;
use crate::core::QUERY_COUNT_UNAVAILABLE;
use crate::core::RawTestMetrics;
use crate::core::TestKind;
use crate::interfaces::OptionStore;
use crate::interfaces::ReferenceTable;
use crate::interfaces::StorageError;
use crate::runtime::generators::GeneratorError;
use crate::runtime::generators::StorageReadBase;
use crate::runtime::generators::WorkloadGenerator;
use crate::runtime::intensity::scale;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Option key read on every hot key iteration.
pub const WELL_KNOWN_OPTION_KEY: &str = "site_name";

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Read workload generator over a reference table and an option store.
pub struct StorageReadGenerator<'a, S: ?Sized> {
    /// Base iteration counts.
    base: StorageReadBase,
    /// Backing store.
    store: &'a S,
}

impl<'a, S> StorageReadGenerator<'a, S>
where
    S: ReferenceTable + OptionStore + ?Sized,
{
    /// Creates a generator reading from `store`.
    #[must_use]
    pub const fn new(base: StorageReadBase, store: &'a S) -> Self {
        Self { base, store }
    }
}

/// Work completed so far, reported on success and on failure.
#[derive(Debug, Default)]
struct ReadProgress {
    /// Ids returned by the largest-ids query.
    ids: u64,
    /// Lookups that found a row.
    rows_found: u64,
    /// Option reads that found a value.
    option_hits: u64,
    /// Option reads issued.
    option_reads: u64,
    /// Rows returned by the scan.
    scanned: u64,
}

impl ReadProgress {
    /// Human-readable summary.
    fn describe(&self) -> String {
        format!(
            "Looked up {} rows by id ({} found), read option '{WELL_KNOWN_OPTION_KEY}' {} times \
             ({} hits), and scanned {} rows.",
            self.ids, self.rows_found, self.option_reads, self.option_hits, self.scanned
        )
    }

    /// Wraps a storage error with the progress so far.
    fn fail(&self, error: &StorageError) -> GeneratorError {
        GeneratorError::storage(TestKind::StorageRead, error, self.describe())
    }
}

impl<S> WorkloadGenerator for StorageReadGenerator<'_, S>
where
    S: ReferenceTable + OptionStore + ?Sized,
{
    fn kind(&self) -> TestKind {
        TestKind::StorageRead
    }

    fn run(&self, intensity: Intensity) -> Result<RawTestMetrics, GeneratorError> {
        let lookups = scale(self.base.point_lookups, intensity);
        let option_reads = scale(self.base.option_reads, intensity);
        let scan_size = scale(self.base.scan_size, intensity);
        let mut progress = ReadProgress::default();
        let queries_before = self.store.query_count();

        let started = Instant::now();
        let ids = self.store.largest_ids(lookups).map_err(|err| progress.fail(&err))?;
        progress.ids = u64::try_from(ids.len()).unwrap_or(u64::MAX);
        for id in ids {
            if self.store.title_by_id(id).map_err(|err| progress.fail(&err))?.is_some() {
                progress.rows_found += 1;
            }
        }
        for _ in 0..option_reads {
            let value = self
                .store
                .get_option(WELL_KNOWN_OPTION_KEY)
                .map_err(|err| progress.fail(&err))?;
            progress.option_reads += 1;
            if value.is_some() {
                progress.option_hits += 1;
            }
        }
        let scanned = self.store.scan(scan_size).map_err(|err| progress.fail(&err))?;
        progress.scanned = u64::try_from(scanned.len()).unwrap_or(u64::MAX);
        let elapsed = started.elapsed().as_secs_f64();

        let query_count = match (queries_before, self.store.query_count()) {
            (Some(before), Some(after)) => {
                i64::try_from(after.saturating_sub(before)).unwrap_or(i64::MAX)
            }
            _ => QUERY_COUNT_UNAVAILABLE,
        };
        let mut metrics = RawTestMetrics::new(TestKind::StorageRead, intensity, elapsed)
            .with_counter("point_lookups", progress.ids)
            .with_counter("rows_found", progress.rows_found)
            .with_counter("option_reads", progress.option_reads)
            .with_counter("rows_scanned", progress.scanned)
            .with_detail(progress.describe());
        metrics.query_count = Some(query_count);
        Ok(metrics)
    }
}
