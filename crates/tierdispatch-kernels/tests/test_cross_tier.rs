//! Cross-tier equivalence tests.
//!
//! Every registered tier must agree with the fallback under the operation's
//! tolerance, whether or not the host supports the tier's extension.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tierdispatch_core::{Dispatcher, Extension, StaticProbe, FALLBACK_LABEL};
use tierdispatch_kernels::increment::{increment_fallback, TOLERANCE};
use tierdispatch_kernels::increment_slice::increment_slice_fallback;
use tierdispatch_kernels::{
    increment_registry, slice_registry, IncrementFn, SliceFn, INCREMENT, INCREMENT_SLICE,
};

fn increment_tiers() -> Vec<(&'static str, IncrementFn)> {
    increment_registry()
        .unwrap()
        .entries_for(INCREMENT)
        .unwrap()
        .into_iter()
        .map(|e| (e.label(), e.kernel()))
        .collect()
}

fn slice_tiers() -> Vec<(&'static str, SliceFn)> {
    slice_registry()
        .unwrap()
        .entries_for(INCREMENT_SLICE)
        .unwrap()
        .into_iter()
        .map(|e| (e.label(), e.kernel()))
        .collect()
}

#[test]
fn every_increment_tier_matches_checker_contract() {
    let tiers = increment_tiers();
    assert_eq!(tiers.len(), Extension::ALL.len() + 1);

    for (label, kernel) in tiers {
        let mut arr = [2.0_f32, 3.0, 4.0, 5.0];
        kernel(&mut arr);
        assert_eq!(arr, [3.0, 4.0, 5.0, 6.0], "tier {label}");
    }
}

#[test]
fn every_slice_tier_handles_all_remainders() {
    for (label, kernel) in slice_tiers() {
        for len in 0..40 {
            let mut data: Vec<f32> = (0..len).map(|i| i as f32 * 0.25).collect();
            let mut expected = data.clone();
            increment_slice_fallback(&mut expected);
            kernel(&mut data);
            assert_eq!(data, expected, "tier {label}, len {len}");
        }
    }
}

#[test]
fn simulated_hosts_select_each_tier() {
    let registry = Arc::new(increment_registry().unwrap());

    for ext in Extension::ALL {
        let dispatcher = Dispatcher::with_probe(registry.clone(), StaticProbe::new([ext]));
        let resolved = dispatcher.resolve(INCREMENT).unwrap();
        assert_eq!(resolved.extension(), Some(ext));
        assert_eq!(resolved.label(), ext.label());

        let mut arr = [2.0_f32, 3.0, 4.0, 5.0];
        dispatcher.dispatch(INCREMENT, |f| f(&mut arr)).unwrap();
        assert_eq!(arr, [3.0, 4.0, 5.0, 6.0]);
    }

    let dispatcher = Dispatcher::with_probe(registry, StaticProbe::none());
    assert_eq!(dispatcher.selected_label(INCREMENT).unwrap(), FALLBACK_LABEL);
}

#[test]
fn slice_dispatch_prefers_widest_simulated_tier() {
    let registry = Arc::new(slice_registry().unwrap());
    let cases = [
        (vec![Extension::Sse, Extension::Sse2], "SSE2"),
        (vec![Extension::Sse2, Extension::Avx], "AVX"),
        (vec![Extension::Avx, Extension::Avx2], "AVX2"),
        (vec![Extension::Sse42], FALLBACK_LABEL),
        (vec![Extension::Neon], "NEON"),
    ];

    for (set, expected) in cases {
        let dispatcher = Dispatcher::with_probe(registry.clone(), StaticProbe::new(set));
        assert_eq!(dispatcher.selected_label(INCREMENT_SLICE).unwrap(), expected);
    }
}

#[test]
fn global_dispatch_matches_fallback() {
    let mut arr = [2.0_f32, 3.0, 4.0, 5.0];
    tierdispatch_kernels::increment(&mut arr);
    assert_eq!(arr, [3.0, 4.0, 5.0, 6.0]);

    let mut data = vec![-1.0_f32; 1025];
    tierdispatch_kernels::increment_slice(&mut data);
    assert!(data.iter().all(|&x| x == 0.0));
}

#[test]
fn batch_matches_per_vector_calls() {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut batch: Vec<[f32; 4]> = (0..5000)
        .map(|_| std::array::from_fn(|_| rng.gen_range(-1.0e4..1.0e4)))
        .collect();
    let expected: Vec<[f32; 4]> = batch
        .iter()
        .map(|v| {
            let mut v = *v;
            increment_fallback(&mut v);
            v
        })
        .collect();

    tierdispatch_kernels::increment_batch(&mut batch);
    assert_eq!(batch, expected);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn increment_tiers_equivalent(arr in prop::array::uniform4(any::<f32>())) {
        let mut expected = arr;
        increment_fallback(&mut expected);

        for (label, kernel) in increment_tiers() {
            let mut actual = arr;
            kernel(&mut actual);
            prop_assert!(
                TOLERANCE.all_match(&expected, &actual),
                "tier {} diverged at lane {:?}: {:?} vs {:?}",
                label,
                TOLERANCE.first_mismatch(&expected, &actual),
                actual,
                expected
            );
        }
    }

    #[test]
    fn slice_tiers_equivalent(data in prop::collection::vec(any::<f32>(), 0..200)) {
        let mut expected = data.clone();
        increment_slice_fallback(&mut expected);

        for (label, kernel) in slice_tiers() {
            let mut actual = data.clone();
            kernel(&mut actual);
            prop_assert!(
                TOLERANCE.all_match(&expected, &actual),
                "tier {} diverged at {:?}",
                label,
                TOLERANCE.first_mismatch(&expected, &actual)
            );
        }
    }

    #[test]
    fn finite_inputs_stay_close(arr in prop::array::uniform4(-1.0e6_f32..1.0e6)) {
        let mut actual = arr;
        tierdispatch_kernels::increment(&mut actual);
        for (a, x) in actual.iter().zip(arr) {
            approx::assert_relative_eq!(*a, x + 1.0, max_relative = 1e-6);
        }
    }
}
