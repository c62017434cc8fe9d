// crates/site-bench-store-sqlite/src/lib.rs
// ============================================================================
// Module: Site Bench SQLite Store
// Description: SQLite-backed storage collaborators for the benchmark harness.
// Purpose: Provide durable records, component state, workload tables, and results.
// Dependencies: site-bench-core, rusqlite
// ============================================================================

//! ## Overview
//! A single `SQLite` database backs every storage collaborator the harness
//! needs: the durable pending-restore record, the component registry, the
//! reference and option tables the workloads exercise, the scratch table,
//! and persisted benchmark results.

pub mod store;

pub use store::DEFAULT_STORE_PATH;
pub use store::SqliteBenchStore;
pub use store::SqliteJournalMode;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
pub use store::StoredResult;
pub use store::engine_version;
