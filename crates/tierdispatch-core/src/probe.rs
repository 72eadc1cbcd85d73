//! Feature probes answering "is extension X available".
//!
//! The dispatcher only ever consumes a boolean per [`Extension`]. Where that
//! boolean comes from is pluggable: the host's cached detection results, a
//! fixed set for simulating other machines, or either of those narrowed by a
//! [`DispatchConfig`].

use crate::config::features::{dispatch_config, host_capabilities, DispatchConfig};
use crate::extension::{CapabilitySet, Extension};

/// Source of extension availability.
///
/// Implementations must be deterministic: once a query has answered, the
/// same query answers the same way for the rest of the process.
pub trait FeatureProbe: Send + Sync {
    /// Check whether `extension` is available.
    fn is_available(&self, extension: Extension) -> bool;

    /// Every available extension.
    fn capabilities(&self) -> CapabilitySet {
        Extension::ALL
            .into_iter()
            .filter(|ext| self.is_available(*ext))
            .collect()
    }
}

/// Probe backed by the process-wide host detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl FeatureProbe for HostProbe {
    #[inline]
    fn is_available(&self, extension: Extension) -> bool {
        host_capabilities().contains(extension)
    }

    fn capabilities(&self) -> CapabilitySet {
        host_capabilities()
    }
}

/// Probe reporting a fixed set of extensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticProbe {
    set: CapabilitySet,
}

impl StaticProbe {
    /// Report exactly the given extensions.
    pub fn new<I: IntoIterator<Item = Extension>>(extensions: I) -> Self {
        Self {
            set: extensions.into_iter().collect(),
        }
    }

    /// Report nothing available.
    pub const fn none() -> Self {
        Self {
            set: CapabilitySet::empty(),
        }
    }

    /// Report every extension available.
    pub fn all() -> Self {
        Self {
            set: CapabilitySet::all(),
        }
    }
}

impl From<CapabilitySet> for StaticProbe {
    fn from(set: CapabilitySet) -> Self {
        Self { set }
    }
}

impl FeatureProbe for StaticProbe {
    #[inline]
    fn is_available(&self, extension: Extension) -> bool {
        self.set.contains(extension)
    }

    fn capabilities(&self) -> CapabilitySet {
        self.set
    }
}

/// Probe narrowed by a [`DispatchConfig`].
///
/// The effective set is computed once at construction.
#[derive(Debug, Clone)]
pub struct ConfiguredProbe<P> {
    inner: P,
    config: DispatchConfig,
    effective: CapabilitySet,
}

impl<P: FeatureProbe> ConfiguredProbe<P> {
    /// Wrap `inner`, applying `config` to its capabilities.
    pub fn new(inner: P, config: DispatchConfig) -> Self {
        let effective = config.apply(inner.capabilities());
        Self {
            inner,
            config,
            effective,
        }
    }

    /// The wrapped probe.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The applied configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

impl<P: FeatureProbe> FeatureProbe for ConfiguredProbe<P> {
    #[inline]
    fn is_available(&self, extension: Extension) -> bool {
        self.effective.contains(extension)
    }

    fn capabilities(&self) -> CapabilitySet {
        self.effective
    }
}

/// The host probe narrowed by the process-wide configuration.
pub fn default_probe() -> ConfiguredProbe<HostProbe> {
    ConfiguredProbe::new(HostProbe, dispatch_config().clone())
}
