//! CPU feature detection and runtime dispatch configuration.
//!
//! This module provides runtime detection of available CPU instruction sets,
//! cached once per process, and the configuration that can narrow which of
//! them the dispatcher is allowed to use.

use crate::extension::{CapabilitySet, Extension};
use once_cell::sync::Lazy;

/// Environment variable listing extensions the dispatcher must ignore.
///
/// Comma or whitespace separated names (`"avx2,sse4.2"`), or `all` to force
/// the fallback tier everywhere.
pub const DISABLE_ENV: &str = "TIERDISPATCH_DISABLE";

/// Environment variable toggling implied-feature normalization (`0`/`1`).
pub const REQUIRE_IMPLIED_ENV: &str = "TIERDISPATCH_REQUIRE_IMPLIED";

/// Detect the host's extensions without caching.
///
/// On architectures without a detection primitive the set is empty, which
/// makes every dispatch select its fallback.
pub fn detect_host() -> CapabilitySet {
    #[allow(unused_mut)]
    let mut set = CapabilitySet::empty();

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        macro_rules! probe {
            ($($feature:tt => $ext:ident),* $(,)?) => {
                $(
                    if is_x86_feature_detected!($feature) {
                        set.insert(Extension::$ext);
                    }
                )*
            };
        }
        probe!(
            "sse" => Sse,
            "sse2" => Sse2,
            "sse3" => Sse3,
            "ssse3" => Ssse3,
            "sse4.1" => Sse41,
            "sse4.2" => Sse42,
            "avx" => Avx,
            "avx2" => Avx2,
        );
    }

    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            set.insert(Extension::Neon);
        }
    }

    set
}

/// Host capabilities detected at first use.
pub static HOST_CAPABILITIES: Lazy<CapabilitySet> = Lazy::new(|| {
    let raw = detect_host();
    let normalized = raw.normalized();
    if normalized == raw {
        log::info!("Detected CPU extensions: {normalized}");
    } else {
        log::info!(
            "Detected CPU extensions: {normalized} (ignoring {} without their implied tiers)",
            raw.difference(normalized)
        );
    }
    normalized
});

/// Get the host capabilities, normalized against implied extensions.
#[inline]
pub fn host_capabilities() -> CapabilitySet {
    *HOST_CAPABILITIES
}

/// Configuration narrowing which extensions dispatch may select.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DispatchConfig {
    /// Whether any tier other than the fallback may be selected.
    pub enabled: bool,
    /// Extensions treated as unavailable regardless of the probe.
    pub disabled: CapabilitySet,
    /// Whether an extension counts only when its implied extensions do too.
    pub require_implied: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            disabled: CapabilitySet::empty(),
            require_implied: true,
        }
    }
}

impl DispatchConfig {
    /// Build a configuration from `TIERDISPATCH_*` environment variables.
    ///
    /// Unknown extension names are logged and skipped.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(DISABLE_ENV).ok().as_deref(),
            std::env::var(REQUIRE_IMPLIED_ENV).ok().as_deref(),
        )
    }

    /// Build a configuration from the values of [`DISABLE_ENV`] and
    /// [`REQUIRE_IMPLIED_ENV`], `None` meaning unset.
    pub fn from_values(disable: Option<&str>, require_implied: Option<&str>) -> Self {
        let mut config = Self::default();

        if let Some(list) = disable {
            config.apply_disable_list(list);
        }

        if let Some(value) = require_implied {
            match value.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "no" | "off" => config.require_implied = false,
                "1" | "true" | "yes" | "on" => config.require_implied = true,
                other => log::warn!("Ignoring {REQUIRE_IMPLIED_ENV}={other}: expected 0 or 1"),
            }
        }

        config
    }

    fn apply_disable_list(&mut self, list: &str) {
        for name in list
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|name| !name.is_empty())
        {
            if name.eq_ignore_ascii_case("all") {
                self.enabled = false;
                continue;
            }
            match name.parse::<Extension>() {
                Ok(ext) => self.disabled.insert(ext),
                Err(err) => log::warn!("Ignoring entry in {DISABLE_ENV}: {err}"),
            }
        }
    }

    /// Narrow `available` to what dispatch may use.
    pub fn apply(&self, available: CapabilitySet) -> CapabilitySet {
        if !self.enabled {
            return CapabilitySet::empty();
        }
        let allowed = available.difference(self.disabled);
        if self.require_implied {
            allowed.normalized()
        } else {
            allowed
        }
    }
}

/// Global dispatch configuration, read from the environment on first use.
pub static DISPATCH_CONFIG: Lazy<DispatchConfig> = Lazy::new(DispatchConfig::from_env);

/// Get the process-wide dispatch configuration.
pub fn dispatch_config() -> &'static DispatchConfig {
    &DISPATCH_CONFIG
}

/// Builder for creating a custom dispatch configuration.
pub struct DispatchConfigBuilder {
    config: DispatchConfig,
}

impl DispatchConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
        }
    }

    /// Enable or disable every non-fallback tier.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Treat an extension as unavailable.
    pub fn disable(mut self, extension: Extension) -> Self {
        self.config.disabled.insert(extension);
        self
    }

    /// Parse and disable a list of extension names, as in [`DISABLE_ENV`].
    pub fn disable_list(mut self, list: &str) -> Self {
        self.config.apply_disable_list(list);
        self
    }

    /// Enable or disable implied-feature normalization.
    pub fn require_implied(mut self, require: bool) -> Self {
        self.config.require_implied = require;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> DispatchConfig {
        self.config
    }
}

impl Default for DispatchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
