// crates/site-bench-core/src/runtime/audit.rs
// ============================================================================
// Module: Site Bench Audit Logging
// Description: Run log accumulation and structured audit event sinks.
// Purpose: Record progress and diagnostics without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`RunLog`] collects the ordered human-readable messages stored on each
//! result and forwards every entry to a [`BenchAuditSink`] as a JSON line.
//! Sinks are best-effort: a failed write never fails a benchmark run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::RunId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Progress message.
    Info,
    /// Recoverable problem.
    Warn,
    /// Failure that ended or degraded the run.
    Error,
}

/// Audit event emitted for every run log entry.
#[derive(Debug, Clone, Serialize)]
pub struct BenchAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Run identifier when a run is in progress.
    pub run_id: Option<String>,
    /// Entry severity.
    pub level: LogLevel,
    /// Entry text as stored in the run log.
    pub message: String,
}

impl BenchAuditEvent {
    /// Builds a run log event stamped with the current time.
    #[must_use]
    pub fn new(run_id: Option<&RunId>, level: LogLevel, message: &str) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "bench_log",
            timestamp_ms,
            run_id: run_id.map(ToString::to_string),
            level,
            message: message.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for run log events.
pub trait BenchAuditSink: Send + Sync {
    /// Record a run log event.
    fn record(&self, event: &BenchAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl BenchAuditSink for StderrAuditSink {
    fn record(&self, event: &BenchAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// Locked file handle for audit writes.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl BenchAuditSink for FileAuditSink {
    fn record(&self, event: &BenchAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl BenchAuditSink for NoopAuditSink {
    fn record(&self, _event: &BenchAuditEvent) {}
}

/// Audit sink that keeps events in memory for inspection.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<BenchAuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<BenchAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl BenchAuditSink for MemoryAuditSink {
    fn record(&self, event: &BenchAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Run Log
// ============================================================================

/// Ordered run messages mirrored to an audit sink.
pub struct RunLog {
    /// Run the entries belong to.
    run_id: Option<RunId>,
    /// Entries in emission order.
    entries: Vec<String>,
    /// Destination for structured events.
    sink: Arc<dyn BenchAuditSink>,
}

impl RunLog {
    /// Creates an empty log for `run_id`.
    #[must_use]
    pub fn new(run_id: Option<RunId>, sink: Arc<dyn BenchAuditSink>) -> Self {
        Self {
            run_id,
            entries: Vec::new(),
            sink,
        }
    }

    /// Records a progress message.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    /// Records a warning; the entry is prefixed with `Warning: `.
    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Warn, format!("Warning: {}", message.as_ref()));
    }

    /// Records an error; the entry is prefixed with `Error: `.
    pub fn error(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Error, format!("Error: {}", message.as_ref()));
    }

    /// Returns the entries recorded so far.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Consumes the log, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }

    /// Appends an entry and forwards it to the sink.
    fn push(&mut self, level: LogLevel, entry: String) {
        self.sink.record(&BenchAuditEvent::new(self.run_id.as_ref(), level, &entry));
        self.entries.push(entry);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_mirrored_to_sink_in_order() {
        let sink = Arc::new(MemoryAuditSink::new());
        let mut log = RunLog::new(Some(RunId::new("run-1")), sink.clone());
        log.info("Running CPU test...");
        log.warn("component gone");
        log.error("store offline");
        assert_eq!(
            log.entries(),
            ["Running CPU test...", "Warning: component gone", "Error: store offline"]
        );
        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].level, LogLevel::Warn);
        assert_eq!(events[2].run_id.as_deref(), Some("run-1"));
        assert_eq!(events[0].message, "Running CPU test...");
    }
}
