// crates/site-bench-core/src/runtime/host.rs
// ============================================================================
// Module: Site Bench Host Probes
// Description: System clock, host metadata, and process memory probes.
// Purpose: Default collaborators backed by the operating system.
// Dependencies: std, crate::interfaces
// ============================================================================

//! ## Overview
//! These are the default implementations of [`Clock`], [`EnvironmentProbe`],
//! and [`MemoryProbe`]. Load average and resident memory come from `/proc`
//! when it exists; on other platforms the probes report `None`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::core::EnvironmentInfo;
use crate::core::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::EnvironmentProbe;
use crate::interfaces::MemoryProbe;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}

// ============================================================================
// SECTION: Environment Probe
// ============================================================================

/// Host metadata probe.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironmentProbe {
    /// Extra version strings supplied by other collaborators.
    details: BTreeMap<String, String>,
}

impl HostEnvironmentProbe {
    /// Creates a probe with no extra details.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named version string, e.g. the store engine version.
    #[must_use]
    pub fn with_detail(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(name.into(), value.into());
        self
    }
}

impl EnvironmentProbe for HostEnvironmentProbe {
    fn describe(&self) -> EnvironmentInfo {
        EnvironmentInfo {
            harness_version: env!("CARGO_PKG_VERSION").to_string(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            details: self.details.clone(),
            load_average_before: None,
            load_average_after: None,
        }
    }

    fn load_average(&self) -> Option<String> {
        let raw = fs::read_to_string("/proc/loadavg").ok()?;
        parse_load_average(&raw)
    }
}

/// Extracts the 1, 5, and 15 minute averages from `/proc/loadavg` content.
fn parse_load_average(raw: &str) -> Option<String> {
    let fields: Vec<&str> = raw.split_whitespace().take(3).collect();
    if fields.len() == 3 { Some(fields.join(", ")) } else { None }
}

// ============================================================================
// SECTION: Memory Probe
// ============================================================================

/// Resident set size probe reading `/proc/self/status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatusMemoryProbe;

impl MemoryProbe for ProcStatusMemoryProbe {
    fn current_bytes(&self) -> Option<u64> {
        let raw = fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&raw)
    }
}

/// Parses the `VmRSS` line, reported in kilobytes.
fn parse_vm_rss(raw: &str) -> Option<u64> {
    let line = raw.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kilobytes: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    kilobytes.checked_mul(1024)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
