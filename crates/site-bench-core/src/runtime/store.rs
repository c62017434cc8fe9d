// crates/site-bench-core/src/runtime/store.rs
// ============================================================================
// Module: Site Bench In-Memory Collaborators
// Description: In-memory registry, record store, storage, and result sink.
// Purpose: Deterministic collaborators for tests and dry runs.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! These implementations keep all state behind `Arc<Mutex<..>>`, so clones
//! share state and tests can inspect what a run did after handing a clone to
//! the orchestrator. Each exposes failure toggles for exercising error paths.
//! They are not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::core::BenchmarkResult;
use crate::core::ComponentId;
use crate::core::ComponentSet;
use crate::interfaces::ComponentError;
use crate::interfaces::ComponentRegistry;
use crate::interfaces::DurableRecordStore;
use crate::interfaces::OptionStore;
use crate::interfaces::PersistenceError;
use crate::interfaces::ReferenceTable;
use crate::interfaces::ResultRef;
use crate::interfaces::ResultSink;
use crate::interfaces::ScratchTable;
use crate::interfaces::StorageError;
use crate::interfaces::StoreError;

/// Locks `mutex`, reporting poisoning as a message naming `what`.
fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, String> {
    mutex.lock().map_err(|_| format!("{what} mutex poisoned"))
}

// ============================================================================
// SECTION: Component Registry
// ============================================================================

/// Registry state protected by a mutex.
#[derive(Debug, Default)]
struct RegistryState {
    /// Installed components.
    installed: BTreeSet<ComponentId>,
    /// Active components.
    active: ComponentSet,
    /// Components whose activation fails, with the reported reason.
    failing: BTreeMap<ComponentId, String>,
    /// When true every call fails with a registry error.
    unreachable: bool,
}

/// In-memory component registry.
#[derive(Debug, Default, Clone)]
pub struct InMemoryComponentRegistry {
    /// Shared registry state.
    state: Arc<Mutex<RegistryState>>,
}

impl InMemoryComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with `installed` components, of which `active` are active.
    ///
    /// Active components are installed implicitly.
    #[must_use]
    pub fn with_components<'a>(
        installed: impl IntoIterator<Item = &'a str>,
        active: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut state = RegistryState::default();
        state.installed.extend(installed.into_iter().map(ComponentId::new));
        for id in active {
            state.installed.insert(ComponentId::new(id));
            state.active.insert(ComponentId::new(id));
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Makes activation of `id` fail with `reason`.
    pub fn fail_activation(&self, id: &str, reason: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.failing.insert(ComponentId::new(id), reason.to_string());
        }
    }

    /// Removes `id` from the installed set without deactivating it.
    pub fn uninstall(&self, id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.installed.remove(&ComponentId::new(id));
        }
    }

    /// Makes every subsequent call fail when `unreachable` is true.
    pub fn set_unreachable(&self, unreachable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unreachable = unreachable;
        }
    }

    /// Returns the active set, bypassing failure toggles.
    #[must_use]
    pub fn active(&self) -> ComponentSet {
        self.state.lock().map(|state| state.active.clone()).unwrap_or_default()
    }

    /// Locks the state, reporting poisoning and unreachability as errors.
    fn guard(&self) -> Result<MutexGuard<'_, RegistryState>, ComponentError> {
        let state = lock(&self.state, "component registry").map_err(ComponentError::Registry)?;
        if state.unreachable {
            return Err(ComponentError::Registry("component registry unreachable".to_string()));
        }
        Ok(state)
    }
}

impl ComponentRegistry for InMemoryComponentRegistry {
    fn list_active(&self) -> Result<ComponentSet, ComponentError> {
        Ok(self.guard()?.active.clone())
    }

    fn activate(&self, component: &ComponentId) -> Result<(), ComponentError> {
        let mut state = self.guard()?;
        if !state.installed.contains(component) {
            return Err(ComponentError::NotInstalled(component.to_string()));
        }
        if let Some(reason) = state.failing.get(component) {
            return Err(ComponentError::ActivationFailed {
                component: component.to_string(),
                reason: reason.clone(),
            });
        }
        state.active.insert(component.clone());
        Ok(())
    }

    fn deactivate(&self, components: &ComponentSet) -> Result<(), ComponentError> {
        let mut state = self.guard()?;
        for component in components {
            state.active.remove(component);
        }
        Ok(())
    }

    fn is_installed(&self, component: &ComponentId) -> Result<bool, ComponentError> {
        Ok(self.guard()?.installed.contains(component))
    }
}

// ============================================================================
// SECTION: Durable Record Store
// ============================================================================

/// Record store state protected by a mutex.
#[derive(Debug, Default)]
struct RecordState {
    /// Stored values.
    values: BTreeMap<String, String>,
    /// When true writes and deletes fail.
    fail_writes: bool,
}

/// In-memory durable record store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    /// Shared record state.
    state: Arc<Mutex<RecordState>>,
}

impl InMemoryRecordStore {
    /// Creates an empty record store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes and deletes fail when `fail` is true.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_writes = fail;
        }
    }

    /// Returns true when `key` holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().map(|state| state.values.contains_key(key)).unwrap_or(false)
    }

    /// Locks the state for a write.
    fn writable(&self) -> Result<MutexGuard<'_, RecordState>, StoreError> {
        let state = lock(&self.state, "record store").map_err(StoreError::Store)?;
        if state.fail_writes {
            return Err(StoreError::Io("record store is read-only".to_string()));
        }
        Ok(state)
    }
}

impl DurableRecordStore for InMemoryRecordStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let state = lock(&self.state, "record store").map_err(StoreError::Store)?;
        Ok(state.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.writable()?.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.writable()?.values.remove(key);
        Ok(())
    }
}

// ============================================================================
// SECTION: Workload Storage
// ============================================================================

/// Storage state protected by a mutex.
#[derive(Debug, Default)]
struct StorageState {
    /// Reference rows by id.
    rows: BTreeMap<i64, String>,
    /// Option values by key.
    options: BTreeMap<String, String>,
    /// Scratch table rows; `None` until the table is created.
    scratch: Option<Vec<String>>,
    /// Number of times the scratch table was created.
    scratch_creates: u64,
    /// When true every call fails.
    unavailable: bool,
}

/// In-memory reference table, option store, and scratch table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    /// Shared storage state.
    state: Arc<Mutex<StorageState>>,
    /// Queries issued so far.
    queries: Arc<AtomicU64>,
}

impl InMemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage holding `count` reference rows with ids `1..=count`.
    #[must_use]
    pub fn with_reference_rows(count: i64) -> Self {
        let storage = Self::new();
        if let Ok(mut state) = storage.state.lock() {
            for id in 1..=count {
                state.rows.insert(id, format!("Reference row {id}"));
            }
        }
        storage
    }

    /// Stores an option value directly.
    pub fn put_option(&self, key: &str, value: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.options.insert(key.to_string(), value.to_string());
        }
    }

    /// Makes every subsequent call fail when `unavailable` is true.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = unavailable;
        }
    }

    /// Returns the option keys currently stored.
    #[must_use]
    pub fn option_keys(&self) -> Vec<String> {
        self.state.lock().map(|state| state.options.keys().cloned().collect()).unwrap_or_default()
    }

    /// Returns the scratch row count, or `None` when the table does not exist.
    #[must_use]
    pub fn scratch_rows(&self) -> Option<usize> {
        self.state.lock().ok().and_then(|state| state.scratch.as_ref().map(Vec::len))
    }

    /// Returns how many times the scratch table was created.
    #[must_use]
    pub fn scratch_creates(&self) -> u64 {
        self.state.lock().map(|state| state.scratch_creates).unwrap_or(0)
    }

    /// Counts a query and locks the state.
    fn query(&self) -> Result<MutexGuard<'_, StorageState>, StorageError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let state = lock(&self.state, "storage").map_err(StorageError::Unavailable)?;
        if state.unavailable {
            return Err(StorageError::Unavailable("storage offline".to_string()));
        }
        Ok(state)
    }
}

/// Converts a row limit to a collection length.
fn limit_len(limit: u64) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

impl ReferenceTable for InMemoryStorage {
    fn largest_ids(&self, limit: u64) -> Result<Vec<i64>, StorageError> {
        Ok(self.query()?.rows.keys().rev().take(limit_len(limit)).copied().collect())
    }

    fn title_by_id(&self, id: i64) -> Result<Option<String>, StorageError> {
        Ok(self.query()?.rows.get(&id).cloned())
    }

    fn scan(&self, limit: u64) -> Result<Vec<i64>, StorageError> {
        let state = self.query()?;
        Ok(state
            .rows
            .iter()
            .filter(|(_, title)| !title.is_empty())
            .map(|(id, _)| *id)
            .take(limit_len(limit))
            .collect())
    }

    fn query_count(&self) -> Option<u64> {
        Some(self.queries.load(Ordering::Relaxed))
    }
}

impl OptionStore for InMemoryStorage {
    fn get_option(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.query()?.options.get(key).cloned())
    }

    fn create_option(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.query()?.options.entry(key.to_string()).or_insert_with(|| value.to_string());
        Ok(())
    }

    fn update_option(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.query()?.options.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_option(&self, key: &str) -> Result<(), StorageError> {
        self.query()?.options.remove(key);
        Ok(())
    }
}

impl ScratchTable for InMemoryStorage {
    fn scratch_table_exists(&self) -> Result<bool, StorageError> {
        Ok(self.query()?.scratch.is_some())
    }

    fn create_scratch_table(&self) -> Result<(), StorageError> {
        let mut state = self.query()?;
        if state.scratch.is_none() {
            state.scratch = Some(Vec::new());
            state.scratch_creates += 1;
        }
        Ok(())
    }

    fn insert_scratch_row(&self, data: &str) -> Result<(), StorageError> {
        let mut state = self.query()?;
        let rows = state
            .scratch
            .as_mut()
            .ok_or_else(|| StorageError::Query("scratch table does not exist".to_string()))?;
        rows.push(data.to_string());
        Ok(())
    }

    fn truncate_scratch_table(&self) -> Result<(), StorageError> {
        let mut state = self.query()?;
        let rows = state
            .scratch
            .as_mut()
            .ok_or_else(|| StorageError::Query("scratch table does not exist".to_string()))?;
        rows.clear();
        Ok(())
    }
}

// ============================================================================
// SECTION: Result Sink
// ============================================================================

/// In-memory result sink.
#[derive(Debug, Default, Clone)]
pub struct InMemoryResultSink {
    /// Persisted results in order.
    results: Arc<Mutex<Vec<BenchmarkResult>>>,
    /// Reason every persist fails with, when set.
    failure: Arc<Mutex<Option<String>>>,
}

impl InMemoryResultSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent persist fail with `reason`.
    pub fn fail_with(&self, reason: &str) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(reason.to_string());
        }
    }

    /// Returns the persisted results.
    #[must_use]
    pub fn results(&self) -> Vec<BenchmarkResult> {
        self.results.lock().map(|results| results.clone()).unwrap_or_default()
    }
}

impl ResultSink for InMemoryResultSink {
    fn persist(&self, result: &BenchmarkResult) -> Result<ResultRef, PersistenceError> {
        if let Some(reason) = lock(&self.failure, "result sink").map_err(PersistenceError::Store)?.clone() {
            return Err(PersistenceError::Store(reason));
        }
        lock(&self.results, "result sink").map_err(PersistenceError::Store)?.push(result.clone());
        Ok(ResultRef {
            id: result.run_id.to_string(),
            title: result.title(),
        })
    }
}
