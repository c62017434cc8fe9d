// crates/site-bench-core/tests/proptest_scoring.rs
// ============================================================================
// Module: Scaling and Scoring Property-Based Tests
// Description: Property tests for the scaler, normalizer, and diff.
// Purpose: Check monotonicity, floors, determinism, and self-protection.
// ============================================================================

//! Property-based tests for scaling, scoring, and environment diff invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use site_bench_core::ComponentId;
use site_bench_core::ComponentSet;
use site_bench_core::EnvironmentDiff;
use site_bench_core::Intensity;
use site_bench_core::RawTestMetrics;
use site_bench_core::TestKind;
use site_bench_core::scale;
use site_bench_core::score;

fn component_set_strategy() -> impl Strategy<Value = ComponentSet> {
    prop::collection::btree_set(
        prop_oneof![Just("site-bench".to_string()), "[a-e]{1,3}"],
        0 .. 8,
    )
    .prop_map(|ids| ids.into_iter().map(ComponentId::new).collect())
}

fn time_kind_strategy() -> impl Strategy<Value = TestKind> {
    prop_oneof![Just(TestKind::Compute), Just(TestKind::StorageRead), Just(TestKind::StorageWrite)]
}

proptest! {
    #[test]
    fn scale_is_monotonic_in_intensity(base in 0_u64 .. 10_000_000, low in 0_i64 ..= 100, high in 0_i64 ..= 100) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        prop_assert!(scale(base, Intensity::clamped(low)) <= scale(base, Intensity::clamped(high)));
    }

    #[test]
    fn scale_at_zero_keeps_one_percent_floor(base in 1_u64 .. 10_000_000) {
        let scaled = scale(base, Intensity::MIN);
        prop_assert!(scaled > 0);
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "Test bases are small.")]
        let floor = (base as f64 * 0.01).round() as u64;
        prop_assert!(scaled >= floor);
    }

    #[test]
    fn scale_never_exceeds_base(base in 0_u64 .. 10_000_000, value in 0_i64 ..= 100) {
        prop_assert!(scale(base, Intensity::clamped(value)) <= base.max(1));
    }

    #[test]
    fn time_scores_are_deterministic_and_decreasing(
        kind in time_kind_strategy(),
        faster in 0.001_f64 .. 100.0,
        delta in 0.001_f64 .. 100.0,
    ) {
        let fast = score(&[RawTestMetrics::new(kind, Intensity::DEFAULT, faster)]);
        let again = score(&[RawTestMetrics::new(kind, Intensity::DEFAULT, faster)]);
        let slow = score(&[RawTestMetrics::new(kind, Intensity::DEFAULT, faster + delta)]);
        prop_assert_eq!(fast, again);
        prop_assert!(slow.component(kind) < fast.component(kind));
        prop_assert!((fast.total - fast.component(kind)).abs() < 1e-9);
    }

    #[test]
    fn memory_scores_decrease_with_peak(peak in 1024_u64 .. 1 << 40, extra in 1_u64 .. 1 << 30) {
        let mut small = RawTestMetrics::new(TestKind::Memory, Intensity::DEFAULT, 0.5);
        small.peak_memory_bytes = Some(peak);
        let mut large = small.clone();
        large.peak_memory_bytes = Some(peak + extra);
        prop_assert!(score(&[large]).memory < score(&[small]).memory);
    }

    #[test]
    fn diff_never_touches_harness_component(
        current in component_set_strategy(),
        requested in component_set_strategy(),
    ) {
        let own = ComponentId::new("site-bench");
        let diff = EnvironmentDiff::compute(&current, &requested, &own);
        prop_assert!(!diff.to_activate.contains(&own));
        prop_assert!(!diff.to_deactivate.contains(&own));
        for id in &diff.to_activate {
            prop_assert!(!diff.to_deactivate.contains(id));
            prop_assert!(requested.contains(id) && !current.contains(id));
        }
        for id in &diff.to_deactivate {
            prop_assert!(current.contains(id) && !requested.contains(id));
        }
    }
}
