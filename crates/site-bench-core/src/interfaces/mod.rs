// crates/site-bench-core/src/interfaces/mod.rs
// ============================================================================
// Module: Site Bench Interfaces
// Description: Backend-agnostic collaborator interfaces for the harness.
// Purpose: Define the contract surfaces used by the benchmark runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the harness reaches the component registry, durable
//! storage, workload backing stores, result persistence, and host metadata
//! without embedding backend-specific details. All methods take `&self`;
//! implementations use interior mutability where they need it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::BenchmarkProfile;
use crate::core::BenchmarkResult;
use crate::core::ComponentId;
use crate::core::ComponentSet;
use crate::core::EnvironmentInfo;
use crate::core::ProfileId;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Wall-clock source for result timestamps.
pub trait Clock {
    /// Returns the current wall-clock time.
    fn now(&self) -> Timestamp;
}

// ============================================================================
// SECTION: Component Registry
// ============================================================================

/// Component registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// Component is not installed and cannot be activated.
    #[error("component not installed: {0}")]
    NotInstalled(String),
    /// Component refused activation.
    #[error("activation failed for {component}: {reason}")]
    ActivationFailed {
        /// Component identifier.
        component: String,
        /// Failure reason reported by the registry.
        reason: String,
    },
    /// Registry backend failure.
    #[error("component registry error: {0}")]
    Registry(String),
}

/// Source of truth for which optional components are active.
pub trait ComponentRegistry {
    /// Lists currently active components.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Registry`] when the registry is unreachable.
    fn list_active(&self) -> Result<ComponentSet, ComponentError>;

    /// Activates a single component.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError`] when the component cannot be activated.
    fn activate(&self, component: &ComponentId) -> Result<(), ComponentError>;

    /// Deactivates every component in `components`.
    ///
    /// Deactivating an inactive component is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Registry`] when the registry is unreachable.
    fn deactivate(&self, components: &ComponentSet) -> Result<(), ComponentError>;

    /// Returns true when the component is still present and activatable.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Registry`] when the registry is unreachable.
    fn is_installed(&self, component: &ComponentId) -> Result<bool, ComponentError>;
}

// ============================================================================
// SECTION: Durable Record Store
// ============================================================================

/// Durable key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("record store io error: {0}")]
    Io(String),
    /// Stored value could not be decoded.
    #[error("record store corruption: {0}")]
    Corrupt(String),
    /// Store backend error.
    #[error("record store error: {0}")]
    Store(String),
}

/// Key-value store whose contents survive process restarts.
pub trait DurableRecordStore {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value durably.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write cannot be made durable.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes `key`; deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete cannot be made durable.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Workload Backing Stores
// ============================================================================

/// Errors from stores that back storage workloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Backing store is unreachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Backing store rejected the query.
    #[error("storage query failed: {0}")]
    Query(String),
}

/// Reference table with an auto-increment id and a title-like column.
pub trait ReferenceTable {
    /// Returns up to `limit` ids, largest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the table cannot be queried.
    fn largest_ids(&self, limit: u64) -> Result<Vec<i64>, StorageError>;

    /// Looks up the title of the row with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the table cannot be queried.
    fn title_by_id(&self, id: i64) -> Result<Option<String>, StorageError>;

    /// Runs a filtered, paginated scan and returns matching ids.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the table cannot be queried.
    fn scan(&self, limit: u64) -> Result<Vec<i64>, StorageError>;

    /// Returns the number of queries issued so far, when the store tracks it.
    fn query_count(&self) -> Option<u64> {
        None
    }
}

/// Key-value option store supporting create, update, and delete by key.
pub trait OptionStore {
    /// Reads an option value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be queried.
    fn get_option(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Creates an option; creating an existing key leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be written.
    fn create_option(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Updates an option value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be written.
    fn update_option(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes an option; deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be written.
    fn delete_option(&self, key: &str) -> Result<(), StorageError>;
}

/// Scratch table used for bulk insert and truncate workloads.
pub trait ScratchTable {
    /// Returns true when the scratch table exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the schema cannot be inspected.
    fn scratch_table_exists(&self) -> Result<bool, StorageError>;

    /// Creates the scratch table if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the table cannot be created.
    fn create_scratch_table(&self) -> Result<(), StorageError>;

    /// Inserts one row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the insert fails.
    fn insert_scratch_row(&self, data: &str) -> Result<(), StorageError>;

    /// Removes every row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the truncate fails.
    fn truncate_scratch_table(&self) -> Result<(), StorageError>;
}

/// Runs the explicit ensure-schema step: existence probe, then create.
///
/// # Errors
///
/// Returns [`StorageError`] when the probe or the create fails.
pub fn ensure_scratch_table<T: ScratchTable + ?Sized>(table: &T) -> Result<bool, StorageError> {
    if table.scratch_table_exists()? {
        return Ok(false);
    }
    table.create_scratch_table()?;
    Ok(true)
}

// ============================================================================
// SECTION: Result Persistence
// ============================================================================

/// Result persistence errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Result could not be serialized.
    #[error("result serialization failed: {0}")]
    Serialize(String),
    /// Result could not be written.
    #[error("result store error: {0}")]
    Store(String),
}

/// Reference to a persisted result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRef {
    /// Persisted record identifier.
    pub id: String,
    /// Persisted record title.
    pub title: String,
}

/// External persistence collaborator for benchmark results.
pub trait ResultSink {
    /// Persists a completed result.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the result cannot be saved.
    fn persist(&self, result: &BenchmarkResult) -> Result<ResultRef, PersistenceError>;
}

// ============================================================================
// SECTION: Host Probes
// ============================================================================

/// Source of host and runtime metadata.
pub trait EnvironmentProbe {
    /// Describes the host; load averages are filled in by the orchestrator.
    fn describe(&self) -> EnvironmentInfo;

    /// Returns the current system load average, when available.
    fn load_average(&self) -> Option<String>;
}

/// Source of process memory usage readings.
pub trait MemoryProbe {
    /// Returns current memory usage in bytes, when available.
    fn current_bytes(&self) -> Option<u64>;
}

// ============================================================================
// SECTION: Profiles
// ============================================================================

/// Lookup for persisted benchmark profiles.
pub trait ProfileResolver {
    /// Returns the profile with `id`, if it exists.
    fn profile(&self, id: &ProfileId) -> Option<BenchmarkProfile>;
}
