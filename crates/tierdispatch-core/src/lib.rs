//! Core types for runtime CPU-feature dispatch.
//!
//! This crate detects which instruction-set extensions the running CPU
//! offers, keeps a registry of interchangeable kernel implementations per
//! logical operation, and resolves each operation to its best available
//! implementation exactly once.
//!
//! # Key Concepts
//!
//! - **Extension**: a CPU capability tier such as SSE4.1 or NEON
//! - **Capability Set**: the extensions available on the host, fixed per process
//! - **Kernel Entry**: an implementation registered for an operation under an
//!   extension, or as the operation's single fallback
//! - **Dispatch Result**: the memoized implementation chosen for an operation
//!
//! # Modules
//!
//! - [`config`]: Host detection and dispatch configuration
//! - [`dispatcher`]: Priority-ordered resolution with per-operation memoization
//! - [`error`]: Error types for registration and dispatch
//! - [`extension`]: Extension tags and capability sets
//! - [`probe`]: Pluggable feature probes
//! - [`registry`]: Kernel registry and the `register_kernels!` macro
//! - [`tolerance`]: Cross-tier numeric equivalence policy
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tierdispatch_core::prelude::*;
//!
//! fn sum_fast(v: &[u32]) -> u32 { v.iter().sum() }
//! fn sum(v: &[u32]) -> u32 { v.iter().fold(0, |a, b| a + b) }
//!
//! let registry = Arc::new(KernelRegistry::<fn(&[u32]) -> u32>::new());
//! register_kernels!(registry, "sum" => {
//!     Avx2 => sum_fast,
//!     _ => sum,
//! })
//! .unwrap();
//!
//! // Simulate a host without any extension.
//! let dispatcher = Dispatcher::with_probe(registry, StaticProbe::none());
//! assert_eq!(dispatcher.selected_label("sum").unwrap(), "fallback");
//! assert_eq!(dispatcher.dispatch("sum", |f| f(&[1, 2, 3])).unwrap(), 6);
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extension;
pub mod probe;
pub mod registry;
pub mod tolerance;

// Re-export commonly used items at the crate root
pub use config::{
    detect_host, dispatch_config, host_capabilities, DispatchConfig, DispatchConfigBuilder,
};
pub use dispatcher::{DispatchResult, Dispatcher, Selection};
pub use error::{DispatchError, Result};
pub use extension::{CapabilitySet, Extension};
pub use probe::{default_probe, ConfiguredProbe, FeatureProbe, HostProbe, StaticProbe};
pub use registry::{KernelEntry, KernelRegistry, OperationChain, FALLBACK_LABEL};
pub use tolerance::{Lane, Tolerance};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use tierdispatch_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{host_capabilities, DispatchConfig, DispatchConfigBuilder};
    pub use crate::dispatcher::{DispatchResult, Dispatcher, Selection};
    pub use crate::error::{DispatchError, Result};
    pub use crate::extension::{CapabilitySet, Extension};
    pub use crate::probe::{ConfiguredProbe, FeatureProbe, HostProbe, StaticProbe};
    pub use crate::register_kernels;
    pub use crate::registry::{KernelEntry, KernelRegistry};
    pub use crate::tolerance::Tolerance;
}
