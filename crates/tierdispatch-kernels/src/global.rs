//! Process-wide dispatchers for the built-in kernels.
//!
//! The registries are populated and frozen on first use; after that every
//! call is a cached function-pointer load.

use crate::increment::{register_increment, IncrementFn, INCREMENT};
use crate::increment_slice::{register_increment_slice, SliceFn, INCREMENT_SLICE};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tierdispatch_core::{DispatchResult, Dispatcher, KernelRegistry, Result, Selection};

fn build<F: Copy + Send + Sync + 'static>(
    register: fn(&KernelRegistry<F>) -> Result<()>,
) -> Result<Dispatcher<F>> {
    let registry = Arc::new(KernelRegistry::new());
    register(&registry)?;
    let dispatcher = Dispatcher::new(registry);
    dispatcher.initialize()?;
    Ok(dispatcher)
}

/// Global dispatcher for `increment`.
static INCREMENT_DISPATCHER: Lazy<Dispatcher<IncrementFn>> =
    Lazy::new(|| match build(register_increment) {
        Ok(dispatcher) => dispatcher,
        Err(err) => panic!("failed to initialize the increment dispatcher: {err}"),
    });

/// Global dispatcher for `increment_slice`.
static SLICE_DISPATCHER: Lazy<Dispatcher<SliceFn>> =
    Lazy::new(|| match build(register_increment_slice) {
        Ok(dispatcher) => dispatcher,
        Err(err) => panic!("failed to initialize the increment_slice dispatcher: {err}"),
    });

static INCREMENT_KERNEL: Lazy<DispatchResult<IncrementFn>> =
    Lazy::new(|| match INCREMENT_DISPATCHER.resolve(INCREMENT) {
        Ok(resolved) => resolved,
        Err(err) => panic!("{err}"),
    });

static SLICE_KERNEL: Lazy<DispatchResult<SliceFn>> =
    Lazy::new(|| match SLICE_DISPATCHER.resolve(INCREMENT_SLICE) {
        Ok(resolved) => resolved,
        Err(err) => panic!("{err}"),
    });

/// Get the global `increment` dispatcher.
pub fn increment_dispatcher() -> &'static Dispatcher<IncrementFn> {
    &INCREMENT_DISPATCHER
}

/// Get the global `increment_slice` dispatcher.
pub fn slice_dispatcher() -> &'static Dispatcher<SliceFn> {
    &SLICE_DISPATCHER
}

/// The tier selected for `increment`.
pub fn increment_kernel() -> DispatchResult<IncrementFn> {
    *INCREMENT_KERNEL
}

/// The tier selected for `increment_slice`.
pub fn slice_kernel() -> DispatchResult<SliceFn> {
    *SLICE_KERNEL
}

/// Add 1.0 to each lane using the best tier for this host.
///
/// # Panics
///
/// Panics on first use if the kernel registry cannot be initialized.
#[inline]
pub fn increment(arr: &mut [f32; 4]) {
    (INCREMENT_KERNEL.kernel())(arr);
}

/// Add 1.0 to every element using the best tier for this host.
#[inline]
pub fn increment_slice(data: &mut [f32]) {
    (SLICE_KERNEL.kernel())(data);
}

/// Selection summary for every built-in operation.
pub fn selected_tiers() -> Vec<Selection> {
    let mut selections = Vec::with_capacity(2);
    for report in [INCREMENT_DISPATCHER.report(), SLICE_DISPATCHER.report()] {
        match report {
            Ok(rows) => selections.extend(rows),
            Err(err) => log::warn!("Dispatch report unavailable: {err}"),
        }
    }
    selections
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierdispatch_core::{dispatch_config, host_capabilities};

    #[test]
    fn test_global_increment() {
        let mut arr = [2.0, 3.0, 4.0, 5.0];
        increment(&mut arr);
        assert_eq!(arr, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_global_selection_is_available() {
        let selected = increment_kernel();
        if let Some(ext) = selected.extension() {
            let effective = dispatch_config().apply(host_capabilities());
            assert!(effective.contains(ext));
        }
        // Stable across calls.
        assert_eq!(increment_kernel().label(), selected.label());
    }

    #[test]
    fn test_selected_tiers_lists_both_operations() {
        let names: Vec<_> = selected_tiers().iter().map(|s| s.operation).collect();
        assert_eq!(names, vec![INCREMENT, INCREMENT_SLICE]);
    }
}
