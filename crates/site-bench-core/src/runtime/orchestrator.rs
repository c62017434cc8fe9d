// crates/site-bench-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Site Bench Orchestrator
// Description: Runs a validated request end to end and scores the results.
// Purpose: Sequence lease, environment, workloads, scoring, and restoration.
// Dependencies: thiserror, crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! [`BenchmarkOrchestrator::run_benchmark`] acquires the run lease, refuses to
//! start while a pending restore record exists, snapshots and reconfigures
//! the environment, runs the selected generators strictly in
//! [`TestKind::ORDERED`] order, scores them, and restores the environment on
//! every exit path. Failures carry the log accumulated through restoration.
//! Cancellation is cooperative and scoped to one run: it is honored before
//! the snapshot and between generators, and cleared when the run ends.
//!
//! The orchestrator never persists results itself;
//! [`BenchmarkOrchestrator::run_and_persist`] hands a finished result to a
//! [`ResultSink`] after restoration has completed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::core::BenchmarkRequest;
use crate::core::BenchmarkResult;
use crate::core::ComponentId;
use crate::core::ComponentSet;
use crate::core::EnvironmentInfo;
use crate::core::Intensity;
use crate::core::RawBenchmarkRequest;
use crate::core::RawTestMetrics;
use crate::core::RunId;
use crate::core::TestKind;
use crate::core::Timestamp;
use crate::core::ValidationError;
use crate::core::format_seconds;
use crate::interfaces::Clock;
use crate::interfaces::ComponentError;
use crate::interfaces::ComponentRegistry;
use crate::interfaces::DurableRecordStore;
use crate::interfaces::EnvironmentProbe;
use crate::interfaces::MemoryProbe;
use crate::interfaces::OptionStore;
use crate::interfaces::PersistenceError;
use crate::interfaces::ProfileResolver;
use crate::interfaces::ReferenceTable;
use crate::interfaces::ResultRef;
use crate::interfaces::ResultSink;
use crate::interfaces::ScratchTable;
use crate::interfaces::StoreError;
use crate::runtime::audit::BenchAuditSink;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::audit::RunLog;
use crate::runtime::environment::EnvironmentController;
use crate::runtime::environment::EnvironmentState;
use crate::runtime::environment::read_pending_record;
use crate::runtime::environment::restore_pending;
use crate::runtime::generators::ComputeGenerator;
use crate::runtime::generators::GeneratorError;
use crate::runtime::generators::MemoryGenerator;
use crate::runtime::generators::StorageReadGenerator;
use crate::runtime::generators::StorageWriteGenerator;
use crate::runtime::generators::WorkloadBase;
use crate::runtime::generators::WorkloadGenerator;
use crate::runtime::host::HostEnvironmentProbe;
use crate::runtime::host::ProcStatusMemoryProbe;
use crate::runtime::host::SystemClock;
use crate::runtime::lease::CancelFlag;
use crate::runtime::lease::RunLock;
use crate::runtime::score::score;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default identifier of the harness's own component.
pub const DEFAULT_SELF_COMPONENT: &str = "site-bench";

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Harness's own component; never activated or deactivated by a run.
    pub self_component: ComponentId,
    /// Base iteration counts for every generator.
    pub workloads: WorkloadBase,
    /// Intensity used for a selected test with no explicit intensity.
    pub default_intensity: Intensity,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            self_component: ComponentId::new(DEFAULT_SELF_COMPONENT),
            workloads: WorkloadBase::default(),
            default_intensity: Intensity::DEFAULT,
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of resuming a pending restoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    /// True when a pending record was found and reverted.
    pub restored: bool,
    /// Log of the restoration.
    pub log: Vec<String>,
}

/// A persisted benchmark result.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRun {
    /// The completed result.
    pub result: BenchmarkResult,
    /// Reference returned by the sink.
    pub reference: ResultRef,
}

/// Measurement phase output.
struct Measurement {
    /// Wall-clock start.
    start: Timestamp,
    /// Wall-clock end.
    end: Timestamp,
    /// Monotonic duration in seconds.
    duration_seconds: f64,
    /// Metrics in execution order.
    per_test: Vec<RawTestMetrics>,
    /// Host metadata captured at the start.
    info: EnvironmentInfo,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Benchmark orchestrator over a registry, record store, and workload storage.
pub struct BenchmarkOrchestrator<R, K, S> {
    /// Component registry.
    registry: R,
    /// Durable record store for the pending restore record.
    records: K,
    /// Storage backing the storage workloads.
    storage: S,
    /// Orchestrator configuration.
    config: OrchestratorConfig,
    /// Wall clock for timestamps.
    clock: Box<dyn Clock>,
    /// Host metadata probe.
    environment: Box<dyn EnvironmentProbe>,
    /// Process memory probe.
    memory: Box<dyn MemoryProbe>,
    /// Destination for run log events.
    audit: Arc<dyn BenchAuditSink>,
    /// Run-level lease.
    lock: RunLock,
    /// Cooperative cancellation flag.
    cancel: CancelFlag,
}

impl<R, K, S> BenchmarkOrchestrator<R, K, S>
where
    R: ComponentRegistry,
    K: DurableRecordStore,
    S: ReferenceTable + OptionStore + ScratchTable,
{
    /// Creates an orchestrator with host probes and a silent audit sink.
    #[must_use]
    pub fn new(registry: R, records: K, storage: S, config: OrchestratorConfig) -> Self {
        Self {
            registry,
            records,
            storage,
            config,
            clock: Box::new(SystemClock),
            environment: Box::new(HostEnvironmentProbe::new()),
            memory: Box::new(ProcStatusMemoryProbe),
            audit: Arc::new(NoopAuditSink),
            lock: RunLock::new(),
            cancel: CancelFlag::new(),
        }
    }

    /// Replaces the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the host metadata probe.
    #[must_use]
    pub fn with_environment_probe(mut self, probe: impl EnvironmentProbe + 'static) -> Self {
        self.environment = Box::new(probe);
        self
    }

    /// Replaces the memory probe.
    #[must_use]
    pub fn with_memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.memory = Box::new(probe);
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn BenchAuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Shares `lock` with other orchestrators.
    #[must_use]
    pub fn with_run_lock(mut self, lock: RunLock) -> Self {
        self.lock = lock;
        self
    }

    /// Uses `cancel` as the cancellation flag.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a handle to the cancellation flag.
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Validates a raw request and runs it.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::Validation`] for a malformed request and any
    /// error [`Self::run_benchmark`] returns.
    pub fn run_raw(
        &self,
        raw: &RawBenchmarkRequest,
        profiles: Option<&dyn ProfileResolver>,
    ) -> Result<BenchmarkResult, BenchmarkFailure> {
        let request = raw.resolve(profiles).map_err(|err| BenchmarkFailure {
            log: vec![format!("Error: invalid benchmark request: {err}")],
            error: BenchmarkError::Validation(err),
        })?;
        self.run_benchmark(&request)
    }

    /// Runs a validated request.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkFailure`] holding the first fatal error and the log
    /// accumulated through restoration.
    ///
    /// A cancellation request applies to one run: the flag is cleared when the
    /// run holding the lease ends, whatever its outcome.
    pub fn run_benchmark(&self, request: &BenchmarkRequest) -> Result<BenchmarkResult, BenchmarkFailure> {
        let Some(_guard) = self.lock.try_acquire() else {
            return Err(self.lease_held_failure());
        };
        let outcome = self.run_leased(request);
        self.cancel.reset();
        outcome
    }

    /// Runs a validated request while the caller holds the lease.
    fn run_leased(&self, request: &BenchmarkRequest) -> Result<BenchmarkResult, BenchmarkFailure> {
        let run_id = RunId::generate(self.clock.now());
        let mut log = RunLog::new(Some(run_id.clone()), Arc::clone(&self.audit));

        match read_pending_record(&self.records) {
            Ok(None) => {}
            Ok(Some(_)) => {
                log.error("A previous run left component changes that have not been restored.");
                return Err(BenchmarkFailure::new(BenchmarkError::RestorePending, log));
            }
            Err(err) => {
                log.error(err.to_string());
                return Err(BenchmarkFailure::new(err, log));
            }
        }
        if self.cancel.is_cancelled() {
            log.warn("Benchmark cancelled before start; components left untouched.");
            return Err(BenchmarkFailure::new(BenchmarkError::Cancelled, log));
        }
        log.info(format!("Starting benchmark {run_id}."));

        let mut controller = EnvironmentController::new(
            &self.registry,
            &self.records,
            self.config.self_component.clone(),
        );
        let before = match controller.snapshot() {
            Ok(before) => before,
            Err(err) => {
                log.error(err.to_string());
                return Err(BenchmarkFailure::new(err, log));
            }
        };
        log.info(format!("Active components before run: {}", describe_set(&before)));

        if let Err(err) = controller.reconfigure(&before, request.components(), &mut log) {
            log.error("Environment reconfiguration failed; no tests were run.");
            if let Err(restore_err) = controller.restore(&mut log) {
                log.error(restore_err.to_string());
            }
            return Err(BenchmarkFailure::new(err, log));
        }

        let measured = self.measure(request, &mut controller, &mut log);
        let restored = controller.restore(&mut log);

        let measurement = match (measured, restored) {
            (Err(err), restored) => {
                if let Err(restore_err) = restored {
                    log.error(restore_err.to_string());
                }
                return Err(BenchmarkFailure::new(err, log));
            }
            (Ok(_), Err(err)) => {
                log.error(err.to_string());
                return Err(BenchmarkFailure::new(err, log));
            }
            (Ok(measurement), Ok(())) => measurement,
        };

        let after = match self.registry.list_active() {
            Ok(after) => after,
            Err(err) => {
                log.error(err.to_string());
                return Err(BenchmarkFailure::new(err.into(), log));
            }
        };
        if after != before {
            log.warn(format!(
                "Active components after restore differ from the snapshot: {}",
                describe_set(&after)
            ));
        }

        let raw_scores = score(&measurement.per_test);
        log.info(format!(
            "Benchmark completed in {}. Total score: {:.2}",
            format_seconds(measurement.duration_seconds),
            raw_scores.total
        ));
        let mut info = measurement.info;
        info.load_average_after = self.environment.load_average();

        Ok(BenchmarkResult {
            run_id,
            start_timestamp: measurement.start,
            end_timestamp: measurement.end,
            total_duration_seconds: measurement.duration_seconds,
            per_test: measurement.per_test,
            raw_scores,
            scores: raw_scores.rounded(),
            environment_before: before,
            environment_user_requested: request.components().clone(),
            environment_after: after,
            environment_info: info,
            profile_id: request.profile_id().cloned(),
            log: log.into_entries(),
        })
    }

    /// Runs a validated request and persists the result after restoration.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::Persistence`] when the sink rejects the
    /// result, and any error [`Self::run_benchmark`] returns.
    pub fn run_and_persist(
        &self,
        request: &BenchmarkRequest,
        sink: &dyn ResultSink,
    ) -> Result<PersistedRun, BenchmarkFailure> {
        let result = self.run_benchmark(request)?;
        match sink.persist(&result) {
            Ok(reference) => Ok(PersistedRun { result, reference }),
            Err(err) => {
                let mut log = result.log;
                log.push(format!("Error: failed to save benchmark result: {err}"));
                Err(BenchmarkFailure {
                    error: err.into(),
                    log,
                })
            }
        }
    }

    /// Reverts a pending restore record left by an interrupted run.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::RunInProgress`] while a run holds the lease
    /// and the restoration error otherwise.
    pub fn resume_pending_restore(&self) -> Result<RestoreReport, BenchmarkFailure> {
        let Some(_guard) = self.lock.try_acquire() else {
            return Err(self.lease_held_failure());
        };
        let mut log = RunLog::new(None, Arc::clone(&self.audit));
        match restore_pending(&self.registry, &self.records, &mut log) {
            Ok(restored) => Ok(RestoreReport {
                restored,
                log: log.into_entries(),
            }),
            Err(err) => {
                log.error(err.to_string());
                Err(BenchmarkFailure::new(err, log))
            }
        }
    }

    /// Returns true when a pending restore record exists.
    ///
    /// # Errors
    ///
    /// Returns [`BenchmarkError::Store`] when the record store cannot be read.
    pub fn has_pending_restore(&self) -> Result<bool, BenchmarkError> {
        Ok(read_pending_record(&self.records)?.is_some())
    }

    /// Builds the failure returned when another run holds the lease.
    fn lease_held_failure(&self) -> BenchmarkFailure {
        let mut log = RunLog::new(None, Arc::clone(&self.audit));
        log.error("Another benchmark run holds the lease.");
        BenchmarkFailure::new(BenchmarkError::RunInProgress, log)
    }

    /// Runs the selected generators in order.
    fn measure(
        &self,
        request: &BenchmarkRequest,
        controller: &mut EnvironmentController<'_, R, K>,
        log: &mut RunLog,
    ) -> Result<Measurement, BenchmarkError> {
        controller.begin_measuring()?;
        let mut info = self.environment.describe();
        info.load_average_before = self.environment.load_average();
        let start = self.clock.now();
        let started = Instant::now();

        let mut per_test = Vec::new();
        for kind in TestKind::ORDERED.into_iter().filter(|kind| request.is_selected(*kind)) {
            if self.cancel.is_cancelled() {
                log.warn("Benchmark cancelled; remaining tests skipped.");
                return Err(BenchmarkError::Cancelled);
            }
            let intensity = request.intensity_for(kind).unwrap_or_else(|| {
                let fallback = self.config.default_intensity;
                log.warn(format!(
                    "Intensity for test \"{kind}\" not found, defaulted to {}.",
                    fallback.percent()
                ));
                fallback
            });
            log.info(format!("Running {} test at {intensity}...", kind.display_name()));
            match self.generator(kind).run(intensity) {
                Ok(metrics) => {
                    log.info(format!("{} test completed. {}", kind.display_name(), metrics.summary()));
                    per_test.push(metrics);
                }
                Err(err) => {
                    log.error(format!(
                        "{} test failed: {}. {}",
                        kind.display_name(),
                        err.reason,
                        err.detail
                    ));
                    return Err(err.into());
                }
            }
        }

        Ok(Measurement {
            start,
            end: self.clock.now(),
            duration_seconds: started.elapsed().as_secs_f64(),
            per_test,
            info,
        })
    }

    /// Returns the generator implementing `kind`.
    fn generator(&self, kind: TestKind) -> Box<dyn WorkloadGenerator + '_> {
        let workloads = &self.config.workloads;
        match kind {
            TestKind::Compute => Box::new(ComputeGenerator::new(workloads.compute)),
            TestKind::Memory => Box::new(MemoryGenerator::new(workloads.memory, self.memory.as_ref())),
            TestKind::StorageRead => {
                Box::new(StorageReadGenerator::new(workloads.storage_read, &self.storage))
            }
            TestKind::StorageWrite => {
                Box::new(StorageWriteGenerator::new(workloads.storage_write, &self.storage))
            }
        }
    }
}

/// Formats a component set for log lines.
fn describe_set(set: &ComponentSet) -> String {
    if set.is_empty() { "(none)".to_string() } else { set.joined() }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Benchmark run errors.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// Request failed validation.
    #[error("invalid benchmark request: {0}")]
    Validation(#[from] ValidationError),
    /// Another run holds the lease.
    #[error("a benchmark run is already in progress")]
    RunInProgress,
    /// A pending restore record must be resolved first.
    #[error("a pending environment restore must complete before a new run")]
    RestorePending,
    /// One or more component changes failed.
    #[error("environment reconfiguration failed: {}", failures.join("; "))]
    EnvironmentReconfigure {
        /// Failure messages in the order they occurred.
        failures: Vec<String>,
    },
    /// A workload generator failed.
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    /// Restoration could not revert every recorded change.
    #[error("environment restore incomplete: {0}")]
    Restore(String),
    /// Durable record store error.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Component registry error.
    #[error(transparent)]
    Component(#[from] ComponentError),
    /// Run was cancelled between tests.
    #[error("benchmark run cancelled")]
    Cancelled,
    /// Environment controller action invalid from its current state.
    #[error("invalid environment transition: cannot {action} while {from}")]
    InvalidTransition {
        /// State the controller was in.
        from: EnvironmentState,
        /// Action attempted.
        action: &'static str,
    },
    /// Result could not be persisted after a successful run.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Failed run: the first fatal error plus the accumulated log.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct BenchmarkFailure {
    /// First fatal error.
    #[source]
    pub error: BenchmarkError,
    /// Log accumulated up to and including restoration.
    pub log: Vec<String>,
}

impl BenchmarkFailure {
    /// Builds a failure from an error and a run log.
    fn new(error: BenchmarkError, log: RunLog) -> Self {
        Self {
            error,
            log: log.into_entries(),
        }
    }
}
