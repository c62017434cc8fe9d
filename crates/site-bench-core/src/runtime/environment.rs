// crates/site-bench-core/src/runtime/environment.rs
// ============================================================================
// Module: Site Bench Environment Controller
// Description: Snapshot, reconfigure, and restore of active components.
// Purpose: Apply a temporary component set and always put it back.
// Dependencies: serde_json, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The controller owns the only path by which a run mutates component
//! activation. It walks `Idle -> Snapshotted -> Reconfigured -> Measuring ->
//! Restoring -> Idle`, with a short-circuit from `Reconfigured` straight to
//! `Restoring` when activation fails.
//!
//! Before any mutation the diff is written to the durable record store under
//! [`PENDING_RESTORE_KEY`]. Restoration reads that record, never in-memory
//! state, so it can resume after a crash and is safe to repeat.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::core::ComponentId;
use crate::core::ComponentSet;
use crate::core::EnvironmentDiff;
use crate::core::PendingRestoreRecord;
use crate::interfaces::ComponentRegistry;
use crate::interfaces::DurableRecordStore;
use crate::interfaces::StoreError;
use crate::runtime::audit::RunLog;
use crate::runtime::orchestrator::BenchmarkError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Durable record store key holding the pending restore record.
pub const PENDING_RESTORE_KEY: &str = "site_bench_pending_restore";

// ============================================================================
// SECTION: State
// ============================================================================

/// Lifecycle state of an environment controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentState {
    /// No run in progress.
    Idle,
    /// Active set captured.
    Snapshotted,
    /// Requested set applied, or partially applied after a failure.
    Reconfigured,
    /// Workloads running.
    Measuring,
    /// Restoration in progress.
    Restoring,
}

impl fmt::Display for EnvironmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Snapshotted => "snapshotted",
            Self::Reconfigured => "reconfigured",
            Self::Measuring => "measuring",
            Self::Restoring => "restoring",
        };
        f.write_str(label)
    }
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Environment controller for a single run.
pub struct EnvironmentController<'a, R: ?Sized, K: ?Sized> {
    /// Component registry being mutated.
    registry: &'a R,
    /// Durable store holding the pending restore record.
    records: &'a K,
    /// Harness's own component identifier; never touched.
    self_id: ComponentId,
    /// Current lifecycle state.
    state: EnvironmentState,
}

impl<'a, R, K> EnvironmentController<'a, R, K>
where
    R: ComponentRegistry + ?Sized,
    K: DurableRecordStore + ?Sized,
{
    /// Creates an idle controller.
    #[must_use]
    pub const fn new(registry: &'a R, records: &'a K, self_id: ComponentId) -> Self {
        Self {
            registry,
            records,
            self_id,
            state: EnvironmentState::Idle,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EnvironmentState {
        self.state
    }

    /// Captures the currently active component set.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::InvalidTransition`] unless idle and
    /// [`BenchmarkError::Component`] when the registry cannot be listed.
    pub fn snapshot(&mut self) -> Result<ComponentSet, BenchmarkError> {
        self.expect_state(EnvironmentState::Idle, "snapshot")?;
        let current = self.registry.list_active()?;
        self.state = EnvironmentState::Snapshotted;
        Ok(current)
    }

    /// Persists the diff between `current` and `requested`, then applies it.
    ///
    /// Deactivations run first. Activations run one at a time in set order
    /// and stop at the first failure; the caller must then call
    /// [`Self::restore`].
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::EnvironmentReconfigure`] when any change
    /// fails, [`BenchmarkError::Store`] when the record cannot be persisted,
    /// and [`BenchmarkError::InvalidTransition`] unless snapshotted.
    pub fn reconfigure(
        &mut self,
        current: &ComponentSet,
        requested: &ComponentSet,
        log: &mut RunLog,
    ) -> Result<EnvironmentDiff, BenchmarkError> {
        self.expect_state(EnvironmentState::Snapshotted, "reconfigure")?;
        let diff = EnvironmentDiff::compute(current, requested, &self.self_id);
        if diff.is_empty() {
            self.state = EnvironmentState::Reconfigured;
            log.info("Requested components match the active set; no changes applied.");
            return Ok(diff);
        }

        write_pending_record(self.records, &PendingRestoreRecord::from(&diff))?;
        self.state = EnvironmentState::Reconfigured;

        let mut failures = Vec::new();
        if !diff.to_deactivate.is_empty() {
            match self.registry.deactivate(&diff.to_deactivate) {
                Ok(()) => log.info(format!(
                    "Deactivated components for the benchmark: {}",
                    diff.to_deactivate.joined()
                )),
                Err(err) => {
                    let message = format!("Failed to deactivate components: {err}");
                    log.error(&message);
                    failures.push(message);
                }
            }
        }

        if failures.is_empty() {
            let mut pending = diff.to_activate.iter();
            for component in pending.by_ref() {
                match self.registry.activate(component) {
                    Ok(()) => log.info(format!("Activated {component} for the benchmark.")),
                    Err(err) => {
                        let message = format!("Failed to activate {component}: {err}");
                        log.error(&message);
                        failures.push(message);
                        break;
                    }
                }
            }
            for skipped in pending {
                log.warn(format!("Skipped activation of {skipped} after an earlier failure."));
            }
        }

        if failures.is_empty() { Ok(diff) } else { Err(BenchmarkError::EnvironmentReconfigure { failures }) }
    }

    /// Marks the start of the measurement phase.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::InvalidTransition`] unless reconfigured.
    pub fn begin_measuring(&mut self) -> Result<(), BenchmarkError> {
        self.expect_state(EnvironmentState::Reconfigured, "begin measuring")?;
        self.state = EnvironmentState::Measuring;
        Ok(())
    }

    /// Restores the environment from the durable record and returns to idle.
    ///
    /// Valid from every state; restoring with no record logs that nothing
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::Restore`] when a recorded change could not be
    /// reverted; the record is kept so restoration can be retried.
    pub fn restore(&mut self, log: &mut RunLog) -> Result<(), BenchmarkError> {
        self.state = EnvironmentState::Restoring;
        let outcome = restore_pending(self.registry, self.records, log);
        self.state = EnvironmentState::Idle;
        outcome.map(|_| ())
    }

    /// Rejects an action that is not valid from the current state.
    fn expect_state(
        &self,
        expected: EnvironmentState,
        action: &'static str,
    ) -> Result<(), BenchmarkError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BenchmarkError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }
}

// ============================================================================
// SECTION: Durable Record
// ============================================================================

/// Reads the pending restore record, if one exists.
///
/// # Errors
///
/// Returns [`BenchmarkError::Store`] when the store cannot be read or the
/// record cannot be decoded.
pub fn read_pending_record<K>(records: &K) -> Result<Option<PendingRestoreRecord>, BenchmarkError>
where
    K: DurableRecordStore + ?Sized,
{
    let Some(raw) = records.get(PENDING_RESTORE_KEY)? else {
        return Ok(None);
    };
    let record = serde_json::from_str(&raw).map_err(|err| {
        StoreError::Corrupt(format!("pending restore record is not valid json: {err}"))
    })?;
    Ok(Some(record))
}

/// Writes the pending restore record durably.
fn write_pending_record<K>(records: &K, record: &PendingRestoreRecord) -> Result<(), BenchmarkError>
where
    K: DurableRecordStore + ?Sized,
{
    let payload = serde_json::to_string(record)
        .map_err(|err| StoreError::Store(format!("failed to encode pending restore record: {err}")))?;
    records.set(PENDING_RESTORE_KEY, &payload)?;
    Ok(())
}

/// Reverts the changes in the pending restore record and clears it.
///
/// Returns true when a record was present. Components that are no longer
/// installed are skipped with a warning.
///
/// # Errors
///
/// Returns [`BenchmarkError::Restore`] when a change could not be reverted and
/// [`BenchmarkError::Store`] when the record cannot be read or cleared.
pub fn restore_pending<R, K>(registry: &R, records: &K, log: &mut RunLog) -> Result<bool, BenchmarkError>
where
    R: ComponentRegistry + ?Sized,
    K: DurableRecordStore + ?Sized,
{
    let Some(record) = read_pending_record(records)? else {
        log.info("Restore: no changes to revert.");
        return Ok(false);
    };
    if record.is_empty() {
        records.delete(PENDING_RESTORE_KEY)?;
        log.info("Restore: no changes to revert.");
        return Ok(true);
    }

    let mut failures = Vec::new();
    if !record.activated_for_test.is_empty() {
        match registry.deactivate(&record.activated_for_test) {
            Ok(()) => log.info(format!(
                "Deactivated components activated for the benchmark: {}",
                record.activated_for_test.joined()
            )),
            Err(err) => {
                let message = format!("Failed to deactivate benchmark components: {err}");
                log.error(&message);
                failures.push(message);
            }
        }
    }

    for component in &record.deactivated_for_test {
        match registry.is_installed(component) {
            Ok(false) => log.warn(format!("Component {component} not found during restoration")),
            Ok(true) => match registry.activate(component) {
                Ok(()) => log.info(format!("Reactivated {component}.")),
                Err(err) => {
                    let message = format!("Failed to reactivate {component}: {err}");
                    log.error(&message);
                    failures.push(message);
                }
            },
            Err(err) => {
                let message = format!("Failed to inspect {component}: {err}");
                log.error(&message);
                failures.push(message);
            }
        }
    }

    if !failures.is_empty() {
        return Err(BenchmarkError::Restore(failures.join("; ")));
    }
    records.delete(PENDING_RESTORE_KEY)?;
    log.info("Component states restored to original configuration.");
    Ok(true)
}
