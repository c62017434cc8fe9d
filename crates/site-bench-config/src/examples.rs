// crates/site-bench-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `site-bench.toml`. The example is kept valid by the
//! config crate's tests.

/// Returns a canonical example `site-bench.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[harness]
self_component = "site-bench"
default_intensity = 50

[store]
path = "site-bench.sqlite"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000

[audit]
sink = "file"
path = "site-bench-audit.jsonl"

[workloads.compute]
math_iterations = 2000000
hash_count = 2000
string_operations = 20000
sort_array_size = 100000
fibonacci_repeats = 10000

[workloads.memory]
element_count = 25000

[workloads.storage_read]
point_lookups = 250
option_reads = 250
scan_size = 100

[workloads.storage_write]
option_round_trips = 100
table_rows = 200

[[profiles]]
id = "cpu-only"
name = "Compute only"
tests = ["compute"]
components = []

[[profiles]]
id = "full-stack"
name = "Everything with caching on"
tests = ["compute", "memory", "storage_read", "storage_write"]
components = ["page-cache", "object-cache"]
"#,
    )
}
