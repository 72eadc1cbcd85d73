//! Runtime CPU-feature dispatch.
//!
//! Detects the instruction-set extensions of the running CPU once, then
//! routes each logical operation to the best of its statically compiled
//! implementations, falling back to a portable one when nothing better is
//! available.
//!
//! This crate re-exports:
//! - [`tierdispatch_core`] as `dispatch`: extensions, probes, registry, dispatcher
//! - [`tierdispatch_kernels`] as `kernels`: the built-in kernels for every tier
//!
//! # Example
//!
//! ```
//! use tierdispatch::prelude::*;
//!
//! let mut arr = [2.0_f32, 3.0, 4.0, 5.0];
//! tierdispatch::increment(&mut arr);
//! assert_eq!(arr, [3.0, 4.0, 5.0, 6.0]);
//!
//! for selection in tierdispatch::selected_tiers() {
//!     println!("{selection}");
//! }
//! # let _ = host_capabilities();
//! ```

pub use tierdispatch_core as dispatch;
pub use tierdispatch_kernels as kernels;

pub use tierdispatch_core::{
    host_capabilities, CapabilitySet, DispatchConfig, DispatchError, Dispatcher, Extension,
    KernelRegistry, Result,
};
pub use tierdispatch_kernels::{
    increment, increment_batch, increment_slice, selected_tiers, ParallelConfig,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tierdispatch_core::prelude::*;
    pub use tierdispatch_kernels::{
        increment, increment_batch, increment_slice, selected_tiers, IncrementFn,
        ParallelConfig, SliceFn,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
