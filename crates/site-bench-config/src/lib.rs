// crates/site-bench-config/src/lib.rs
// ============================================================================
// Module: Site Bench Config Library
// Description: Canonical config model, validation, and example payload.
// Purpose: Single source of truth for site-bench.toml semantics.
// Dependencies: site-bench-core, site-bench-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `site-bench-config` defines the configuration model for the benchmark
//! harness: harness identity, store settings, audit sink selection, workload
//! base iteration overrides, and named profiles. Validation is strict and
//! fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
