// crates/site-bench-core/src/runtime/generators/memory.rs
// ============================================================================
// Module: Site Bench Memory Workload
// Description: Allocates many fixed-size strings and records peak usage.
// Purpose: Measure allocation throughput and peak memory usage.
// Dependencies: crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The memory workload fills a growable container with 1 KiB strings while it
//! is kept alive, reads the memory probe, then releases everything. Peak usage
//! is the larger of the probe's reading while the container is alive and the
//! accounted container size, so the metric stays meaningful when the probe is
//! unavailable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::hint::black_box;
use std::mem::size_of;
use std::time::Instant;

use crate::core::Intensity;
use crate::core::RawTestMetrics;
use crate::core::TestKind;
use crate::core::format_bytes;
use crate::interfaces::MemoryProbe;
use crate::runtime::generators::GeneratorError;
use crate::runtime::generators::MemoryBase;
use crate::runtime::generators::WorkloadGenerator;
use crate::runtime::intensity::scale;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Size in bytes of each allocated string.
pub const ELEMENT_BYTES: usize = 1024;

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Allocation workload generator.
pub struct MemoryGenerator<'a> {
    /// Base element count.
    base: MemoryBase,
    /// Process memory probe.
    probe: &'a dyn MemoryProbe,
}

impl<'a> MemoryGenerator<'a> {
    /// Creates a generator reading usage from `probe`.
    #[must_use]
    pub const fn new(base: MemoryBase, probe: &'a dyn MemoryProbe) -> Self {
        Self { base, probe }
    }
}

impl WorkloadGenerator for MemoryGenerator<'_> {
    fn kind(&self) -> TestKind {
        TestKind::Memory
    }

    fn run(&self, intensity: Intensity) -> Result<RawTestMetrics, GeneratorError> {
        let count = scale(self.base.element_count, intensity);
        let initial = self.probe.current_bytes();

        let started = Instant::now();
        let mut container: Vec<String> = Vec::new();
        for _ in 0..count {
            container.push("x".repeat(ELEMENT_BYTES));
        }
        let accounted = accounted_bytes(&container);
        let reading = self.probe.current_bytes();
        black_box(&container);
        let elapsed = started.elapsed().as_secs_f64();
        drop(container);
        let released = self.probe.current_bytes();

        let peak = reading.unwrap_or(0).max(accounted);

        let detail = format!(
            "Created {count} strings of {ELEMENT_BYTES} bytes. Initial usage: {}, Peak usage: {}, \
             Final usage (after release): {}.",
            describe(initial),
            format_bytes(peak),
            describe(released),
        );
        let mut metrics = RawTestMetrics::new(TestKind::Memory, intensity, elapsed)
            .with_counter("elements", count)
            .with_counter("accounted_bytes", accounted)
            .with_counter("peak_bytes", peak)
            .with_detail(detail);
        for (name, value) in [("initial_bytes", initial), ("final_bytes", released)] {
            if let Some(value) = value {
                metrics = metrics.with_counter(name, value);
            }
        }
        metrics.peak_memory_bytes = Some(peak);
        Ok(metrics)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Sums string capacities and the container's own buffer.
fn accounted_bytes(container: &[String]) -> u64 {
    let strings: usize = container.iter().map(String::capacity).sum();
    let slots = container.len().saturating_mul(size_of::<String>());
    u64::try_from(strings.saturating_add(slots)).unwrap_or(u64::MAX)
}

/// Formats an optional probe reading.
fn describe(reading: Option<u64>) -> String {
    reading.map_or_else(|| "unavailable".to_string(), format_bytes)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions use unwrap for clarity.")]

    use std::cell::Cell;

    use super::*;

    /// Probe that reports nothing.
    struct NoProbe;

    impl MemoryProbe for NoProbe {
        fn current_bytes(&self) -> Option<u64> {
            None
        }
    }

    /// Probe that replays a fixed sequence of readings.
    struct SequenceProbe {
        /// Readings returned in order; the last one repeats.
        readings: Vec<u64>,
        /// Number of readings taken.
        calls: Cell<usize>,
    }

    impl MemoryProbe for SequenceProbe {
        fn current_bytes(&self) -> Option<u64> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            self.readings.get(call).or_else(|| self.readings.last()).copied()
        }
    }

    /// One mebibyte.
    const MIB: u64 = 1024 * 1024;

    #[test]
    fn peak_falls_back_to_accounted_bytes() {
        let generator = MemoryGenerator::new(MemoryBase { element_count: 100 }, &NoProbe);
        let metrics = generator.run(Intensity::MAX).unwrap();
        let peak = metrics.peak_memory_bytes.unwrap();
        assert!(peak >= 100 * 1024);
        assert_eq!(metrics.counters["elements"], 100);
        assert!(metrics.detail.contains("unavailable"));
        assert!(!metrics.counters.contains_key("initial_bytes"));
        assert!(!metrics.counters.contains_key("final_bytes"));
    }

    #[test]
    fn peak_is_absolute_reading_while_alive() {
        let probe = SequenceProbe {
            readings: vec![100 * MIB, 126 * MIB, 101 * MIB],
            calls: Cell::new(0),
        };
        let generator = MemoryGenerator::new(MemoryBase { element_count: 10 }, &probe);
        let metrics = generator.run(Intensity::MAX).unwrap();
        assert_eq!(metrics.peak_memory_bytes, Some(126 * MIB));
        assert_eq!(metrics.counters["initial_bytes"], 100 * MIB);
        assert_eq!(metrics.counters["peak_bytes"], 126 * MIB);
        assert_eq!(metrics.counters["final_bytes"], 101 * MIB);
        assert!(metrics.detail.contains("Peak usage: 126.00 MB"));
    }

    #[test]
    fn peak_uses_accounted_bytes_when_reading_is_lower() {
        let probe = SequenceProbe {
            readings: vec![1_000],
            calls: Cell::new(0),
        };
        let generator = MemoryGenerator::new(MemoryBase { element_count: 100 }, &probe);
        let metrics = generator.run(Intensity::MAX).unwrap();
        let accounted = metrics.counters["accounted_bytes"];
        assert!(accounted >= 100 * 1024);
        assert_eq!(metrics.peak_memory_bytes, Some(accounted));
        assert_eq!(metrics.counters["peak_bytes"], accounted);
    }

    #[test]
    fn intensity_scales_element_count() {
        let generator = MemoryGenerator::new(MemoryBase::default(), &NoProbe);
        let metrics = generator.run(Intensity::MIN).unwrap();
        assert_eq!(metrics.counters["elements"], 250);
    }
}
