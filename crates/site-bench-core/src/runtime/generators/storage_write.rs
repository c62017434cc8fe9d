// crates/site-bench-core/src/runtime/generators/storage_write.rs
// ============================================================================
// Module: Site Bench Storage Write Workload
// Description: Option create/update/delete round trips and scratch inserts.
// Purpose: Measure write latency of the site's backing store.
// Dependencies: rand, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The write workload creates, updates, and deletes scratch option keys, then
//! makes sure the scratch table exists, bulk-inserts rows, and truncates it.
//! The operation count is `3 * round_trips + rows`. Scratch keys use a fixed
//! prefix so they never collide with real site options.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use rand::RngCore;

use crate::core::Intensity;
use crate::core::RawTestMetrics;
use crate::core::TestKind;
use crate::interfaces::OptionStore;
use crate::interfaces::ScratchTable;
use crate::interfaces::StorageError;
use crate::interfaces::ensure_scratch_table;
use crate::runtime::generators::GeneratorError;
use crate::runtime::generators::StorageWriteBase;
use crate::runtime::generators::WorkloadGenerator;
use crate::runtime::intensity::scale;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix for option keys written by the workload.
pub const SCRATCH_OPTION_PREFIX: &str = "site_bench_tmp_opt_";

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Write workload generator over an option store and a scratch table.
pub struct StorageWriteGenerator<'a, S: ?Sized> {
    /// Base iteration counts.
    base: StorageWriteBase,
    /// Backing store.
    store: &'a S,
}

impl<'a, S> StorageWriteGenerator<'a, S>
where
    S: OptionStore + ScratchTable + ?Sized,
{
    /// Creates a generator writing to `store`.
    #[must_use]
    pub const fn new(base: StorageWriteBase, store: &'a S) -> Self {
        Self { base, store }
    }
}

/// Work completed so far, reported on success and on failure.
#[derive(Debug, Default)]
struct WriteProgress {
    /// Options created.
    created: u64,
    /// Options updated.
    updated: u64,
    /// Options deleted.
    deleted: u64,
    /// Scratch rows inserted.
    inserted: u64,
    /// Whether the scratch table had to be created.
    table_created: bool,
}

impl WriteProgress {
    /// Total operations performed.
    const fn operations(&self) -> u64 {
        self.created + self.updated + self.deleted + self.inserted
    }

    /// Human-readable summary.
    fn describe(&self) -> String {
        let table = if self.table_created { " (scratch table created)" } else { "" };
        format!(
            "Performed {} option creates, {} updates, {} deletes, and {} scratch table inserts{table}.",
            self.created, self.updated, self.deleted, self.inserted
        )
    }

    /// Wraps a storage error with the progress so far.
    fn fail(&self, error: &StorageError) -> GeneratorError {
        GeneratorError::storage(TestKind::StorageWrite, error, self.describe())
    }
}

impl<S> WorkloadGenerator for StorageWriteGenerator<'_, S>
where
    S: OptionStore + ScratchTable + ?Sized,
{
    fn kind(&self) -> TestKind {
        TestKind::StorageWrite
    }

    fn run(&self, intensity: Intensity) -> Result<RawTestMetrics, GeneratorError> {
        let round_trips = scale(self.base.option_round_trips, intensity);
        let rows = scale(self.base.table_rows, intensity);
        let mut rng = rand::thread_rng();
        let mut progress = WriteProgress::default();

        let started = Instant::now();
        for index in 0..round_trips {
            let key = format!("{SCRATCH_OPTION_PREFIX}{index}");
            let value = format!("benchmark_data_{}", random_token(&mut rng));
            self.store.create_option(&key, &value).map_err(|err| progress.fail(&err))?;
            progress.created += 1;
        }
        for index in 0..round_trips {
            let key = format!("{SCRATCH_OPTION_PREFIX}{index}");
            let value = format!("updated_data_{}", random_token(&mut rng));
            self.store.update_option(&key, &value).map_err(|err| progress.fail(&err))?;
            progress.updated += 1;
        }
        for index in 0..round_trips {
            let key = format!("{SCRATCH_OPTION_PREFIX}{index}");
            self.store.delete_option(&key).map_err(|err| progress.fail(&err))?;
            progress.deleted += 1;
        }

        let table_created = ensure_scratch_table(self.store).map_err(|err| progress.fail(&err))?;
        progress.table_created = table_created;
        for index in 0..rows {
            let data = format!("test_data_{index}_{}", random_token(&mut rng));
            self.store.insert_scratch_row(&data).map_err(|err| progress.fail(&err))?;
            progress.inserted += 1;
        }
        self.store.truncate_scratch_table().map_err(|err| progress.fail(&err))?;
        let elapsed = started.elapsed().as_secs_f64();

        let mut metrics = RawTestMetrics::new(TestKind::StorageWrite, intensity, elapsed)
            .with_counter("option_creates", progress.created)
            .with_counter("option_updates", progress.updated)
            .with_counter("option_deletes", progress.deleted)
            .with_counter("scratch_inserts", progress.inserted)
            .with_detail(progress.describe());
        metrics.operation_count = Some(progress.operations());
        Ok(metrics)
    }
}

/// Returns 32 random hex characters.
fn random_token(rng: &mut impl RngCore) -> String {
    format!("{:016x}{:016x}", rng.next_u64(), rng.next_u64())
}
