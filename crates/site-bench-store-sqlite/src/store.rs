// crates/site-bench-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Bench Store
// Description: Storage collaborators for the benchmark harness backed by SQLite.
// Purpose: Persist pending-restore records, component state, workload tables,
//          and benchmark results in one database file.
// Dependencies: site-bench-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteBenchStore`] implements every storage collaborator the orchestrator
//! consumes. Clones share one connection, so a single store can be handed to
//! the orchestrator as registry, record store, and workload storage at once.
//! The pending-restore record lives in the `records` table and is written in
//! its own committed statement before any component changes. The scratch
//! table is created on demand by the write workload and its existence is
//! cached for the lifetime of the store.
//! Database contents are untrusted: stored results are parsed and rejected
//! as corrupt when they do not decode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use site_bench_core::BenchmarkResult;
use site_bench_core::ComponentError;
use site_bench_core::ComponentId;
use site_bench_core::ComponentRegistry;
use site_bench_core::ComponentSet;
use site_bench_core::DurableRecordStore;
use site_bench_core::OptionStore;
use site_bench_core::PersistenceError;
use site_bench_core::ReferenceTable;
use site_bench_core::ResultRef;
use site_bench_core::ResultSink;
use site_bench_core::RunId;
use site_bench_core::ScratchTable;
use site_bench_core::StorageError;
use site_bench_core::StoreError;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default database path relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "site-bench.sqlite";
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Status value of rows visible to the filtered scan.
const PUBLISHED_STATUS: &str = "published";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` bench store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default settings.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default database path.
fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Returns the default busy timeout in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored data failed to decode.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store input or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::Db(message)
            | SqliteStoreError::VersionMismatch(message)
            | SqliteStoreError::Invalid(message) => Self::Store(message),
        }
    }
}

impl From<SqliteStoreError> for StorageError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Unavailable(message),
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<SqliteStoreError> for ComponentError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Registry(error.to_string())
    }
}

impl From<SqliteStoreError> for PersistenceError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Store(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Persisted benchmark result with its storage metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    /// Persisted title.
    pub title: String,
    /// Unix milliseconds when the result was saved.
    pub saved_at: i64,
    /// Decoded result.
    pub result: BenchmarkResult,
}

/// `SQLite`-backed storage collaborators.
///
/// # Invariants
/// - Clones share the connection, query counter, and scratch cache.
#[derive(Debug, Clone)]
pub struct SqliteBenchStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection.
    connection: Arc<Mutex<Connection>>,
    /// Workload queries issued through this store.
    queries: Arc<AtomicU64>,
    /// Cached scratch table existence.
    scratch_ready: Arc<AtomicBool>,
}

impl SqliteBenchStore {
    /// Opens an `SQLite`-backed bench store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
            queries: Arc::new(AtomicU64::new(0)),
            scratch_ready: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Registers an installed component, updating its active flag when it
    /// already exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn register_component(
        &self,
        component: &ComponentId,
        active: bool,
    ) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute(
            "INSERT INTO components (id, active, registered_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET active = excluded.active",
            params![component.as_str(), active, unix_millis()],
        )?;
        Ok(())
    }

    /// Removes a component from the installed set.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the write fails.
    pub fn unregister_component(&self, component: &ComponentId) -> Result<bool, SqliteStoreError> {
        let guard = self.lock()?;
        let removed =
            guard.execute("DELETE FROM components WHERE id = ?1", params![component.as_str()])?;
        Ok(removed > 0)
    }

    /// Lists installed components with their active flag, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or a stored id is
    /// invalid.
    pub fn installed_components(&self) -> Result<Vec<(ComponentId, bool)>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard.prepare("SELECT id, active FROM components ORDER BY id")?;
        let rows = statement
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, active)| {
                ComponentId::parse(&id)
                    .map(|id| (id, active))
                    .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))
            })
            .collect()
    }

    /// Appends `count` reference rows and returns the number inserted.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the insert fails.
    pub fn seed_reference_rows(&self, count: u64) -> Result<u64, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction()?;
        let start: i64 =
            tx.query_row("SELECT COALESCE(MAX(id), 0) FROM reference_rows", [], |row| row.get(0))?;
        {
            let mut statement = tx.prepare(
                "INSERT INTO reference_rows (id, title, status, created_at) VALUES (?1, ?2, ?3, \
                 ?4)",
            )?;
            let now = unix_millis();
            for offset in 1..=count {
                let id = start.saturating_add(to_sql_int(offset));
                statement.execute(params![
                    id,
                    format!("Reference row {id}"),
                    PUBLISHED_STATUS,
                    now
                ])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    /// Returns the number of reference rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn reference_row_count(&self) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        let count: i64 = guard.query_row("SELECT COUNT(1) FROM reference_rows", [], |row| row.get(0))?;
        u64::try_from(count).map_err(|_| SqliteStoreError::Corrupt("negative row count".to_string()))
    }

    /// Loads a persisted result by run id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or the stored JSON
    /// does not decode.
    pub fn load_result(&self, run_id: &RunId) -> Result<Option<StoredResult>, SqliteStoreError> {
        let row: Option<(String, i64, String)> = {
            let guard = self.lock()?;
            guard
                .query_row(
                    "SELECT title, saved_at, result_json FROM bench_results WHERE run_id = ?1",
                    params![run_id.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?
        };
        let Some((title, saved_at, json)) = row else {
            return Ok(None);
        };
        let result = serde_json::from_str(&json)
            .map_err(|err| SqliteStoreError::Corrupt(format!("result {run_id}: {err}")))?;
        Ok(Some(StoredResult {
            title,
            saved_at,
            result,
        }))
    }

    /// Lists persisted run ids, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_results(&self, limit: u64) -> Result<Vec<(RunId, String)>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard.prepare(
            "SELECT run_id, title FROM bench_results ORDER BY saved_at DESC, run_id DESC LIMIT ?1",
        )?;
        let rows = statement
            .query_map(params![to_sql_int(limit)], |row| {
                Ok((RunId::new(row.get::<_, String>(0)?), row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Counts one workload query and locks the connection.
    fn query(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.lock().map_err(StorageError::from)
    }
}

// ============================================================================
// SECTION: Durable Records
// ============================================================================

impl DurableRecordStore for SqliteBenchStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.lock()?;
        let value = guard
            .query_row("SELECT value FROM records WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(SqliteStoreError::from)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = \
                 excluded.updated_at",
                params![key, value, unix_millis()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute("DELETE FROM records WHERE key = ?1", params![key])
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Component Registry
// ============================================================================

impl ComponentRegistry for SqliteBenchStore {
    fn list_active(&self) -> Result<ComponentSet, ComponentError> {
        Ok(self
            .installed_components()?
            .into_iter()
            .filter_map(|(id, active)| active.then_some(id))
            .collect())
    }

    fn activate(&self, component: &ComponentId) -> Result<(), ComponentError> {
        let guard = self.lock()?;
        let updated = guard
            .execute("UPDATE components SET active = 1 WHERE id = ?1", params![component.as_str()])
            .map_err(SqliteStoreError::from)?;
        if updated == 0 {
            return Err(ComponentError::NotInstalled(component.to_string()));
        }
        Ok(())
    }

    fn deactivate(&self, components: &ComponentSet) -> Result<(), ComponentError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(SqliteStoreError::from)?;
        for component in components {
            tx.execute("UPDATE components SET active = 0 WHERE id = ?1", params![component.as_str()])
                .map_err(SqliteStoreError::from)?;
        }
        tx.commit().map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn is_installed(&self, component: &ComponentId) -> Result<bool, ComponentError> {
        let guard = self.lock()?;
        let found: Option<i64> = guard
            .query_row("SELECT 1 FROM components WHERE id = ?1", params![component.as_str()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(SqliteStoreError::from)?;
        Ok(found.is_some())
    }
}

// ============================================================================
// SECTION: Workload Tables
// ============================================================================

impl ReferenceTable for SqliteBenchStore {
    fn largest_ids(&self, limit: u64) -> Result<Vec<i64>, StorageError> {
        let guard = self.query()?;
        select_ids(&guard, "SELECT id FROM reference_rows ORDER BY id DESC LIMIT ?1", limit)
    }

    fn title_by_id(&self, id: i64) -> Result<Option<String>, StorageError> {
        let guard = self.query()?;
        let title = guard
            .query_row("SELECT title FROM reference_rows WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(SqliteStoreError::from)?;
        Ok(title)
    }

    fn scan(&self, limit: u64) -> Result<Vec<i64>, StorageError> {
        let guard = self.query()?;
        let mut statement = guard
            .prepare("SELECT id FROM reference_rows WHERE status = ?1 ORDER BY id LIMIT ?2")
            .map_err(SqliteStoreError::from)?;
        let ids = statement
            .query_map(params![PUBLISHED_STATUS, to_sql_int(limit)], |row| row.get(0))
            .and_then(|rows| rows.collect::<Result<Vec<i64>, _>>())
            .map_err(SqliteStoreError::from)?;
        Ok(ids)
    }

    fn query_count(&self) -> Option<u64> {
        Some(self.queries.load(Ordering::Relaxed))
    }
}

impl OptionStore for SqliteBenchStore {
    fn get_option(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.query()?;
        let value = guard
            .query_row("SELECT value FROM options WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(SqliteStoreError::from)?;
        Ok(value)
    }

    fn create_option(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let guard = self.query()?;
        guard
            .execute(
                "INSERT INTO options (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO NOTHING",
                params![key, value],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn update_option(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let guard = self.query()?;
        guard
            .execute(
                "INSERT INTO options (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn delete_option(&self, key: &str) -> Result<(), StorageError> {
        let guard = self.query()?;
        guard
            .execute("DELETE FROM options WHERE key = ?1", params![key])
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }
}

impl ScratchTable for SqliteBenchStore {
    fn scratch_table_exists(&self) -> Result<bool, StorageError> {
        if self.scratch_ready.load(Ordering::Acquire) {
            return Ok(true);
        }
        let guard = self.query()?;
        let found: Option<i64> = guard
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'bench_scratch'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(SqliteStoreError::from)?;
        if found.is_some() {
            self.scratch_ready.store(true, Ordering::Release);
        }
        Ok(found.is_some())
    }

    fn create_scratch_table(&self) -> Result<(), StorageError> {
        let guard = self.query()?;
        guard
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS bench_scratch (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    data TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );",
            )
            .map_err(SqliteStoreError::from)?;
        self.scratch_ready.store(true, Ordering::Release);
        Ok(())
    }

    fn insert_scratch_row(&self, data: &str) -> Result<(), StorageError> {
        let guard = self.query()?;
        guard
            .execute(
                "INSERT INTO bench_scratch (data, created_at) VALUES (?1, ?2)",
                params![data, unix_millis()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn truncate_scratch_table(&self) -> Result<(), StorageError> {
        let guard = self.query()?;
        guard.execute("DELETE FROM bench_scratch", []).map_err(SqliteStoreError::from)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Result Sink
// ============================================================================

impl ResultSink for SqliteBenchStore {
    fn persist(&self, result: &BenchmarkResult) -> Result<ResultRef, PersistenceError> {
        let json = serde_json::to_string(result)
            .map_err(|err| PersistenceError::Serialize(err.to_string()))?;
        let title = result.title();
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO bench_results (run_id, title, total_score, result_json, saved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(run_id) DO UPDATE SET title = excluded.title, total_score = \
                 excluded.total_score, result_json = excluded.result_json, saved_at = \
                 excluded.saved_at",
                params![result.run_id.as_str(), title, result.raw_scores.total, json, unix_millis()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(ResultRef {
            id: result.run_id.to_string(),
            title,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the linked `SQLite` engine version.
#[must_use]
pub fn engine_version() -> &'static str {
    rusqlite::version()
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS records (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS components (
                    id TEXT PRIMARY KEY,
                    active INTEGER NOT NULL,
                    registered_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS reference_rows (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_reference_rows_status
                    ON reference_rows (status, id);
                CREATE TABLE IF NOT EXISTS options (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS bench_results (
                    run_id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    total_score REAL NOT NULL,
                    result_json TEXT NOT NULL,
                    saved_at INTEGER NOT NULL
                );",
            )?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}

/// Runs an id query bounded by `limit`.
fn select_ids(connection: &Connection, sql: &str, limit: u64) -> Result<Vec<i64>, StorageError> {
    let mut statement = connection.prepare(sql).map_err(SqliteStoreError::from)?;
    let ids = statement
        .query_map(params![to_sql_int(limit)], |row| row.get(0))
        .and_then(|rows| rows.collect::<Result<Vec<i64>, _>>())
        .map_err(SqliteStoreError::from)?;
    Ok(ids)
}

/// Converts a count to an `SQLite` integer, saturating at `i64::MAX`.
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
