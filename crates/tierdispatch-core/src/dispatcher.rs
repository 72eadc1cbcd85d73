//! Runtime dispatch based on CPU capabilities.
//!
//! A [`Dispatcher`] resolves an operation to the first entry of its priority
//! chain whose extension the probe reports available, falling back to the
//! extension-independent entry otherwise. The first resolution freezes the
//! registry; each operation's result is memoized in its own once-cell, so
//! later resolutions are lock-free reads.

use crate::error::{DispatchError, Result};
use crate::extension::Extension;
use crate::probe::{default_probe, FeatureProbe};
use crate::registry::{KernelRegistry, OperationChain};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of resolving an operation.
#[derive(Debug, Clone, Copy)]
pub struct DispatchResult<F> {
    kernel: F,
    extension: Option<Extension>,
    label: &'static str,
}

impl<F: Copy> DispatchResult<F> {
    /// The selected implementation.
    #[inline]
    pub fn kernel(&self) -> F {
        self.kernel
    }

    /// Extension of the selected tier, `None` for the fallback.
    #[inline]
    pub fn extension(&self) -> Option<Extension> {
        self.extension
    }

    /// Label of the selected tier.
    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Whether the fallback was selected.
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.extension.is_none()
    }
}

/// Selection summary for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Operation name
    pub operation: &'static str,
    /// Label of the selected tier
    pub label: &'static str,
    /// Extension of the selected tier
    pub extension: Option<Extension>,
    /// Number of tier entries registered besides the fallback
    pub tiers: usize,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({} of {} tiers)",
            self.operation,
            self.label,
            if self.extension.is_some() { "accelerated" } else { "fallback" },
            self.tiers
        )
    }
}

struct Slot<F> {
    chain: OperationChain<F>,
    resolved: OnceCell<DispatchResult<F>>,
}

/// Dispatcher that selects the best implementation at runtime.
pub struct Dispatcher<F> {
    registry: Arc<KernelRegistry<F>>,
    probe: Box<dyn FeatureProbe>,
    table: OnceCell<HashMap<&'static str, Slot<F>>>,
}

impl<F: Copy + Send + Sync + 'static> Dispatcher<F> {
    /// Create a dispatcher using the host probe and the process-wide
    /// configuration.
    pub fn new(registry: Arc<KernelRegistry<F>>) -> Self {
        Self::with_probe(registry, default_probe())
    }

    /// Create a dispatcher with a specific probe.
    pub fn with_probe<P: FeatureProbe + 'static>(
        registry: Arc<KernelRegistry<F>>,
        probe: P,
    ) -> Self {
        Self {
            registry,
            probe: Box::new(probe),
            table: OnceCell::new(),
        }
    }

    /// Get the underlying registry.
    pub fn registry(&self) -> &KernelRegistry<F> {
        &self.registry
    }

    /// Get the probe used for resolution.
    pub fn probe(&self) -> &dyn FeatureProbe {
        &*self.probe
    }

    fn table(&self) -> Result<&HashMap<&'static str, Slot<F>>> {
        self.table.get_or_try_init(|| {
            let snapshot = self.registry.freeze()?;
            Ok(snapshot
                .into_iter()
                .map(|(operation, chain)| {
                    (
                        operation,
                        Slot {
                            chain,
                            resolved: OnceCell::new(),
                        },
                    )
                })
                .collect())
        })
    }

    /// Freeze the registry and resolve every operation now.
    ///
    /// Call this before spawning worker threads to keep the one-time
    /// initialization off the hot path.
    pub fn initialize(&self) -> Result<()> {
        for operation in self.table()?.keys() {
            self.resolve(operation)?;
        }
        Ok(())
    }

    /// Resolve `operation` to its best available implementation.
    pub fn resolve(&self, operation: &str) -> Result<DispatchResult<F>> {
        let slot = self
            .table()?
            .get(operation)
            .ok_or_else(|| DispatchError::unknown_operation(operation))?;

        Ok(*slot
            .resolved
            .get_or_init(|| select(operation, &slot.chain, &*self.probe)))
    }

    /// Resolve `operation` and invoke its implementation through `call`.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tierdispatch_core::{Dispatcher, KernelRegistry};
    ///
    /// fn add_one(x: i32) -> i32 { x + 1 }
    ///
    /// let registry = Arc::new(KernelRegistry::<fn(i32) -> i32>::new());
    /// registry.register("add_one", None, add_one).unwrap();
    ///
    /// let dispatcher = Dispatcher::new(registry);
    /// assert_eq!(dispatcher.dispatch("add_one", |f| f(41)).unwrap(), 42);
    /// ```
    #[inline]
    pub fn dispatch<R>(&self, operation: &str, call: impl FnOnce(F) -> R) -> Result<R> {
        let resolved = self.resolve(operation)?;
        Ok(call(resolved.kernel()))
    }

    /// Label of the tier selected for `operation`.
    pub fn selected_label(&self, operation: &str) -> Result<&'static str> {
        self.resolve(operation).map(|r| r.label())
    }

    /// Selection summary for every operation, sorted by name.
    pub fn report(&self) -> Result<Vec<Selection>> {
        let table = self.table()?;
        let mut operations: Vec<_> = table.keys().copied().collect();
        operations.sort_unstable();

        operations
            .into_iter()
            .map(|operation| {
                let resolved = self.resolve(operation)?;
                Ok(Selection {
                    operation,
                    label: resolved.label(),
                    extension: resolved.extension(),
                    tiers: table[operation].chain.tiers().len(),
                })
            })
            .collect()
    }
}

fn select<F: Copy>(
    operation: &str,
    chain: &OperationChain<F>,
    probe: &dyn FeatureProbe,
) -> DispatchResult<F> {
    let entry = chain
        .tiers()
        .iter()
        .find(|entry| entry.extension().is_some_and(|ext| probe.is_available(ext)))
        .unwrap_or_else(|| chain.fallback());

    log::debug!(
        "Dispatching '{operation}' to {} ({} tiers registered)",
        entry.label(),
        chain.tiers().len()
    );

    DispatchResult {
        kernel: entry.kernel(),
        extension: entry.extension(),
        label: entry.label(),
    }
}

impl<F> fmt::Debug for Dispatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("capabilities", &self.probe.capabilities())
            .field("initialized", &self.table.get().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::StaticProbe;
    use pretty_assertions::assert_eq;

    type Op = fn(u32) -> u32;

    fn scalar(x: u32) -> u32 {
        x + 1
    }
    fn wide(x: u32) -> u32 {
        x + 1
    }

    fn registry() -> Arc<KernelRegistry<Op>> {
        let registry = Arc::new(KernelRegistry::<Op>::new());
        registry.register("inc", Some(Extension::Avx), wide).unwrap();
        registry.register("inc", None, scalar).unwrap();
        registry
    }

    #[test]
    fn test_resolve_selects_tier() {
        let dispatcher = Dispatcher::with_probe(registry(), StaticProbe::all());
        let result = dispatcher.resolve("inc").unwrap();
        assert_eq!(result.label(), "AVX");
        assert_eq!(result.extension(), Some(Extension::Avx));
        assert!(!result.is_fallback());
        assert_eq!((result.kernel())(1), 2);
    }

    #[test]
    fn test_resolve_freezes_registry() {
        let registry = registry();
        let dispatcher = Dispatcher::with_probe(Arc::clone(&registry), StaticProbe::none());
        assert!(!registry.is_frozen());
        assert_eq!(dispatcher.selected_label("inc").unwrap(), "fallback");
        assert!(registry.is_frozen());
    }

    #[test]
    fn test_dispatch_calls_kernel() {
        let dispatcher = Dispatcher::with_probe(registry(), StaticProbe::none());
        assert_eq!(dispatcher.dispatch("inc", |f| f(9)).unwrap(), 10);
        assert!(dispatcher.dispatch("nope", |f| f(9)).is_err());
    }

    #[test]
    fn test_report() {
        let registry = registry();
        registry.register("other", None, scalar).unwrap();
        let dispatcher = Dispatcher::with_probe(registry, StaticProbe::new([Extension::Avx]));

        let report = dispatcher.report().unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].operation, "inc");
        assert_eq!(report[0].label, "AVX");
        assert_eq!(report[0].tiers, 1);
        assert_eq!(report[1].operation, "other");
        assert_eq!(report[1].extension, None);
        assert_eq!(report[1].to_string(), "other: fallback (fallback of 0 tiers)");
    }

    #[test]
    fn test_initialize_surfaces_missing_fallback() {
        let registry = Arc::new(KernelRegistry::<Op>::new());
        registry.register("broken", Some(Extension::Sse2), wide).unwrap();
        let dispatcher = Dispatcher::with_probe(registry, StaticProbe::all());

        let err = dispatcher.initialize().unwrap_err();
        assert_eq!(err, DispatchError::missing_fallback("broken"));
        assert!(dispatcher.resolve("broken").is_err());
    }
}
