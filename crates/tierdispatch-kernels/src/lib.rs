//! SIMD kernels for every supported instruction-set tier.
//!
//! Each operation ships a portable fallback plus one implementation per
//! extension tier, all with the same signature and the same results. The
//! [`global`] module resolves each operation once per process; tier
//! functions can also be called directly and are safe on any host, since
//! they run the fallback when the host lacks their extension.
//!
//! # Example
//!
//! ```
//! let mut arr = [2.0_f32, 3.0, 4.0, 5.0];
//! tierdispatch_kernels::increment(&mut arr);
//! assert_eq!(arr, [3.0, 4.0, 5.0, 6.0]);
//! ```

#![allow(unsafe_code)]

mod arch;
pub mod batch;
pub mod global;
pub mod increment;
pub mod increment_slice;

pub use batch::{increment_batch, increment_batch_with, increment_slice_par, ParallelConfig};
pub use global::{
    increment, increment_dispatcher, increment_kernel, increment_slice, selected_tiers,
    slice_dispatcher, slice_kernel,
};
pub use increment::{register_increment, IncrementFn, INCREMENT};
pub use increment_slice::{register_increment_slice, SliceFn, INCREMENT_SLICE};

use tierdispatch_core::{KernelRegistry, Result};

/// Registry containing every `increment` tier.
pub fn increment_registry() -> Result<KernelRegistry<IncrementFn>> {
    let registry = KernelRegistry::new();
    register_increment(&registry)?;
    Ok(registry)
}

/// Registry containing every `increment_slice` tier.
pub fn slice_registry() -> Result<KernelRegistry<SliceFn>> {
    let registry = KernelRegistry::new();
    register_increment_slice(&registry)?;
    Ok(registry)
}
