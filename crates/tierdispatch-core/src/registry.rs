//! Kernel registry mapping operations to prioritized implementations.
//!
//! Each operation owns an ordered chain of tier entries, most capable
//! extension first, plus exactly one fallback that needs no extension.
//! Entries with equal rank keep their registration order.
//!
//! The registry is populated at startup and frozen by the first resolution.
//! Freezing checks that every operation has its fallback; afterwards any
//! registration fails with [`DispatchError::RegistryFrozen`].

use crate::error::{DispatchError, Result};
use crate::extension::Extension;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Label given to fallback entries.
pub const FALLBACK_LABEL: &str = "fallback";

/// One registered implementation of an operation.
#[derive(Debug, Clone, Copy)]
pub struct KernelEntry<F> {
    extension: Option<Extension>,
    label: &'static str,
    kernel: F,
}

impl<F: Copy> KernelEntry<F> {
    /// Extension required by this entry, `None` for the fallback.
    #[inline]
    pub fn extension(&self) -> Option<Extension> {
        self.extension
    }

    /// Diagnostic label of the tier.
    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The implementation.
    #[inline]
    pub fn kernel(&self) -> F {
        self.kernel
    }

    /// Whether this is the fallback entry.
    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.extension.is_none()
    }
}

/// Frozen view of one operation's chain.
#[derive(Debug, Clone)]
pub struct OperationChain<F> {
    tiers: Vec<KernelEntry<F>>,
    fallback: KernelEntry<F>,
}

impl<F: Copy> OperationChain<F> {
    /// Tier entries in priority order, fallback excluded.
    pub fn tiers(&self) -> &[KernelEntry<F>] {
        &self.tiers
    }

    /// The fallback entry.
    pub fn fallback(&self) -> &KernelEntry<F> {
        &self.fallback
    }

    /// Every entry in priority order, fallback last.
    pub fn entries(&self) -> impl Iterator<Item = &KernelEntry<F>> {
        self.tiers.iter().chain(std::iter::once(&self.fallback))
    }
}

struct PendingChain<F> {
    tiers: Vec<KernelEntry<F>>,
    fallback: Option<KernelEntry<F>>,
}

impl<F> Default for PendingChain<F> {
    fn default() -> Self {
        Self {
            tiers: Vec::new(),
            fallback: None,
        }
    }
}

/// Registry of kernel implementations with signature `F`.
///
/// `F` is normally a function pointer type such as `fn(&mut [f32; 4])`.
pub struct KernelRegistry<F> {
    chains: RwLock<HashMap<&'static str, PendingChain<F>>>,
    frozen: AtomicBool,
}

impl<F: Copy + Send + Sync + 'static> KernelRegistry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            chains: RwLock::new(HashMap::new()),
            frozen: AtomicBool::new(false),
        }
    }

    /// Register `kernel` for `operation`, labelled after its extension.
    ///
    /// `extension = None` registers the fallback.
    pub fn register(
        &self,
        operation: &'static str,
        extension: Option<Extension>,
        kernel: F,
    ) -> Result<()> {
        let label = extension.map_or(FALLBACK_LABEL, Extension::label);
        self.register_labeled(operation, extension, label, kernel)
    }

    /// Register `kernel` for `operation` under a custom label.
    pub fn register_labeled(
        &self,
        operation: &'static str,
        extension: Option<Extension>,
        label: &'static str,
        kernel: F,
    ) -> Result<()> {
        let mut chains = self.chains.write();
        if self.frozen.load(Ordering::Acquire) {
            return Err(DispatchError::registry_frozen(operation));
        }

        let entry = KernelEntry {
            extension,
            label,
            kernel,
        };

        match extension {
            None => {
                // Checked before the entry API so a rejected fallback never
                // creates an empty chain.
                if chains.get(operation).is_some_and(|c| c.fallback.is_some()) {
                    return Err(DispatchError::duplicate_fallback(operation));
                }
                chains.entry(operation).or_default().fallback = Some(entry);
            }
            Some(ext) => {
                let tiers = &mut chains.entry(operation).or_default().tiers;
                let position = tiers
                    .iter()
                    .position(|e| e.extension.is_some_and(|other| other < ext))
                    .unwrap_or(tiers.len());
                tiers.insert(position, entry);
            }
        }
        Ok(())
    }

    /// Entries for `operation` in priority order, fallback last.
    ///
    /// A chain still missing its fallback is returned as registered so far.
    pub fn entries_for(&self, operation: &str) -> Result<Vec<KernelEntry<F>>> {
        let chains = self.chains.read();
        let chain = chains
            .get(operation)
            .ok_or_else(|| DispatchError::unknown_operation(operation))?;
        Ok(chain.tiers.iter().chain(chain.fallback.iter()).copied().collect())
    }

    /// Registered operation names, sorted.
    pub fn operations(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.chains.read().keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Whether `operation` has any entries.
    pub fn contains(&self, operation: &str) -> bool {
        self.chains.read().contains_key(operation)
    }

    /// Whether the registry has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Validate and freeze the registry, returning an immutable snapshot.
    ///
    /// Fails with [`DispatchError::MissingFallback`] if any operation lacks a
    /// fallback; the registry then stays open so the caller can report the
    /// error without leaving a half-initialized dispatcher behind. Freezing
    /// an already frozen registry just takes another snapshot.
    pub fn freeze(&self) -> Result<HashMap<&'static str, OperationChain<F>>> {
        let chains = self.chains.write();

        let mut snapshot = HashMap::with_capacity(chains.len());
        for (&operation, pending) in chains.iter() {
            let fallback = pending
                .fallback
                .ok_or_else(|| DispatchError::missing_fallback(operation))?;
            snapshot.insert(
                operation,
                OperationChain {
                    tiers: pending.tiers.clone(),
                    fallback,
                },
            );
        }

        if !self.frozen.swap(true, Ordering::AcqRel) {
            log::debug!("Kernel registry frozen with {} operations", snapshot.len());
        }
        Ok(snapshot)
    }
}

impl<F: Copy + Send + Sync + 'static> Default for KernelRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> std::fmt::Debug for KernelRegistry<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chains = self.chains.read();
        let mut names: Vec<_> = chains.keys().collect();
        names.sort_unstable();
        f.debug_struct("KernelRegistry")
            .field("operations", &names)
            .field("frozen", &self.frozen.load(Ordering::Relaxed))
            .finish()
    }
}

/// Register a whole priority chain in one expression.
///
/// Tier arms name an [`Extension`] variant; the final `_` arm is the
/// fallback. Evaluates to `Result<()>`, stopping at the first failed
/// registration. Tier arms may carry attributes such as `#[cfg(...)]`.
///
/// ```
/// use tierdispatch_core::{register_kernels, KernelRegistry};
///
/// fn double_fast(x: u32) -> u32 { x << 1 }
/// fn double(x: u32) -> u32 { x * 2 }
///
/// let registry = KernelRegistry::<fn(u32) -> u32>::new();
/// register_kernels!(registry, "double" => {
///     Avx2 => double_fast,
///     _ => double,
/// })
/// .unwrap();
/// assert_eq!(registry.entries_for("double").unwrap().len(), 2);
/// ```
#[macro_export]
macro_rules! register_kernels {
    ($registry:expr, $operation:expr => {
        $( $(#[$meta:meta])* $ext:ident => $kernel:expr, )*
        _ => $fallback:expr $(,)?
    }) => {{
        let registry = &$registry;
        (|| -> $crate::Result<()> {
            $(
                $(#[$meta])*
                registry.register($operation, Some($crate::Extension::$ext), $kernel)?;
            )*
            registry.register($operation, None, $fallback)?;
            Ok(())
        })()
    }};
}
