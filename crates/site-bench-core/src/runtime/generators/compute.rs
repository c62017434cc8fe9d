// crates/site-bench-core/src/runtime/generators/compute.rs
// ============================================================================
// Module: Site Bench Compute Workload
// Description: CPU-bound math, hashing, string, sort, and Fibonacci work.
// Purpose: Measure how quickly the host executes single-threaded compute.
// Dependencies: rand, sha2, crate::runtime
// ============================================================================

//! ## Overview
//! The compute workload runs five phases back to back, each scaled by the
//! same intensity. Intermediate results pass through [`black_box`] so the
//! optimizer cannot elide the work being timed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::hint::black_box;
use std::time::Instant;

use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

use crate::core::Intensity;
use crate::core::RawTestMetrics;
use crate::core::TestKind;
use crate::runtime::generators::ComputeBase;
use crate::runtime::generators::GeneratorError;
use crate::runtime::generators::WorkloadGenerator;
use crate::runtime::intensity::scale;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bytes of random input hashed per hash iteration.
pub const HASH_INPUT_BYTES: usize = 256;

/// Fibonacci index computed on every repetition.
pub const FIB_DEPTH: u32 = 30;

/// Template searched and rewritten by the string phase.
const STRING_TEMPLATE: &str = "The quick brown fox jumps over the lazy dog while the site keeps serving pages";

// ============================================================================
// SECTION: Generator
// ============================================================================

/// CPU-bound workload generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeGenerator {
    /// Base iteration counts.
    base: ComputeBase,
}

impl ComputeGenerator {
    /// Creates a generator with the given base counts.
    #[must_use]
    pub const fn new(base: ComputeBase) -> Self {
        Self { base }
    }
}

impl WorkloadGenerator for ComputeGenerator {
    fn kind(&self) -> TestKind {
        TestKind::Compute
    }

    fn run(&self, intensity: Intensity) -> Result<RawTestMetrics, GeneratorError> {
        let math = scale(self.base.math_iterations, intensity);
        let hashes = scale(self.base.hash_count, intensity);
        let strings = scale(self.base.string_operations, intensity);
        let sort_size = scale(self.base.sort_array_size, intensity);
        let fib_repeats = scale(self.base.fibonacci_repeats, intensity);

        let started = Instant::now();
        black_box(math_phase(math));
        hash_phase(hashes);
        let matches = string_phase(strings);
        sort_phase(sort_size);
        for _ in 0..fib_repeats {
            black_box(fibonacci(black_box(FIB_DEPTH)));
        }
        let elapsed = started.elapsed().as_secs_f64();

        let detail = format!(
            "Performed {math} math operations, {hashes} SHA-256 hashes of {HASH_INPUT_BYTES} bytes, \
             {strings} string operations, sorted {sort_size} integers, and {fib_repeats} \
             Fibonacci({FIB_DEPTH}) computations."
        );
        Ok(RawTestMetrics::new(TestKind::Compute, intensity, elapsed)
            .with_counter("math_operations", math)
            .with_counter("hashes", hashes)
            .with_counter("string_operations", strings)
            .with_counter("string_matches", matches)
            .with_counter("sorted_elements", sort_size)
            .with_counter("fibonacci_runs", fib_repeats)
            .with_detail(detail))
    }
}

// ============================================================================
// SECTION: Phases
// ============================================================================

/// Accumulates square roots, sines, and logarithms.
#[allow(clippy::cast_precision_loss, reason = "Loop index only seeds floating point work.")]
fn math_phase(iterations: u64) -> f64 {
    let mut acc = 0.0_f64;
    for i in 0..iterations {
        let x = i as f64 + 1.0;
        acc += x.sqrt() + (x / 1000.0).sin() + x.ln();
    }
    acc
}

/// Hashes fresh random buffers.
fn hash_phase(count: u64) {
    let mut rng = rand::thread_rng();
    let mut buffer = [0_u8; HASH_INPUT_BYTES];
    for _ in 0..count {
        rng.fill_bytes(&mut buffer);
        black_box(Sha256::digest(buffer));
    }
}

/// Rewrites and searches the template; returns the number of matches found.
fn string_phase(count: u64) -> u64 {
    let mut matches = 0_u64;
    for _ in 0..count {
        let rewritten = black_box(STRING_TEMPLATE).replace("fox", "cat");
        if rewritten.find("cat").is_some() {
            matches += 1;
        }
        black_box(rewritten);
    }
    matches
}

/// Generates and sorts random integers.
fn sort_phase(size: u64) {
    let mut rng = rand::thread_rng();
    let mut values: Vec<u64> = (0..size).map(|_| rng.next_u64()).collect();
    values.sort_unstable();
    black_box(values.first().copied());
}

/// Iterative Fibonacci; wraps on overflow for large depths.
const fn fibonacci(depth: u32) -> u64 {
    let mut previous = 0_u64;
    let mut current = 1_u64;
    let mut step = 0;
    while step < depth {
        let next = previous.wrapping_add(current);
        previous = current;
        current = next;
        step += 1;
    }
    previous
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions use unwrap for clarity.")]

    use super::*;

    /// Small base counts that keep unit tests fast.
    fn tiny_base() -> ComputeBase {
        ComputeBase {
            math_iterations: 1_000,
            hash_count: 10,
            string_operations: 100,
            sort_array_size: 500,
            fibonacci_repeats: 10,
        }
    }

    #[test]
    fn fibonacci_matches_known_values() {
        assert_eq!(fibonacci(0), 0);
        assert_eq!(fibonacci(1), 1);
        assert_eq!(fibonacci(10), 55);
        assert_eq!(fibonacci(FIB_DEPTH), 832_040);
    }

    #[test]
    fn counters_follow_scaled_iterations() {
        let generator = ComputeGenerator::new(tiny_base());
        let metrics = generator.run(Intensity::DEFAULT).unwrap();
        assert_eq!(metrics.kind, TestKind::Compute);
        assert_eq!(metrics.counters["math_operations"], 500);
        assert_eq!(metrics.counters["hashes"], 5);
        assert_eq!(metrics.counters["string_matches"], 50);
        assert_eq!(metrics.counters["sorted_elements"], 250);
        assert!(metrics.elapsed_seconds >= 0.0);
        assert!(metrics.detail.contains("500 math operations"));
    }

    #[test]
    fn zero_intensity_still_does_work() {
        let generator = ComputeGenerator::new(tiny_base());
        let metrics = generator.run(Intensity::MIN).unwrap();
        assert_eq!(metrics.counters["math_operations"], 10);
        assert_eq!(metrics.counters["hashes"], 1);
    }
}
