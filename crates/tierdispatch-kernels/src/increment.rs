//! The `increment` operation: add 1.0 to each lane of a four-lane vector.
//!
//! Every tier produces bit-identical results to [`increment_fallback`]
//! ([`TOLERANCE`] is exact). Tiers that widen to double precision still
//! round once, and a single f32 addition carried out in f64 rounds to the
//! same value as the f32 addition itself.

use crate::arch::guarded_kernel;
use tierdispatch_core::{register_kernels, KernelRegistry, Result, Tolerance};

/// Operation name.
pub const INCREMENT: &str = "increment";

/// Tolerance every tier is held to.
pub const TOLERANCE: Tolerance = Tolerance::Exact;

/// Kernel signature.
pub type IncrementFn = fn(&mut [f32; 4]);

/// Extension-independent implementation.
pub fn increment_fallback(arr: &mut [f32; 4]) {
    for x in arr.iter_mut() {
        *x += 1.0;
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::arch::x86;

#[cfg(target_arch = "aarch64")]
use crate::arch::aarch64;

guarded_kernel! {
    /// SSE tier.
    pub fn increment_sse(arr: &mut [f32; 4]);
    requires Sse on ("x86", "x86_64") => x86::increment_sse;
    otherwise increment_fallback;
}

guarded_kernel! {
    /// SSE2 tier, computing through paired double-precision lanes.
    pub fn increment_sse2(arr: &mut [f32; 4]);
    requires Sse2 on ("x86", "x86_64") => x86::increment_sse2;
    otherwise increment_fallback;
}

guarded_kernel! {
    /// SSE3 tier.
    pub fn increment_sse3(arr: &mut [f32; 4]);
    requires Sse3 on ("x86", "x86_64") => x86::increment_sse3;
    otherwise increment_fallback;
}

guarded_kernel! {
    /// SSSE3 tier.
    pub fn increment_ssse3(arr: &mut [f32; 4]);
    requires Ssse3 on ("x86", "x86_64") => x86::increment_ssse3;
    otherwise increment_fallback;
}

guarded_kernel! {
    /// SSE4.1 tier.
    pub fn increment_sse41(arr: &mut [f32; 4]);
    requires Sse41 on ("x86", "x86_64") => x86::increment_sse41;
    otherwise increment_fallback;
}

guarded_kernel! {
    /// SSE4.2 tier.
    pub fn increment_sse42(arr: &mut [f32; 4]);
    requires Sse42 on ("x86", "x86_64") => x86::increment_sse42;
    otherwise increment_fallback;
}

guarded_kernel! {
    /// AVX tier.
    pub fn increment_avx(arr: &mut [f32; 4]);
    requires Avx on ("x86", "x86_64") => x86::increment_avx;
    otherwise increment_fallback;
}

guarded_kernel! {
    /// AVX2 tier.
    pub fn increment_avx2(arr: &mut [f32; 4]);
    requires Avx2 on ("x86", "x86_64") => x86::increment_avx2;
    otherwise increment_fallback;
}

guarded_kernel! {
    /// NEON tier.
    pub fn increment_neon(arr: &mut [f32; 4]);
    requires Neon on ("aarch64") => aarch64::increment_neon;
    otherwise increment_fallback;
}

/// Register every `increment` tier.
///
/// All tiers are registered on every architecture; the probe decides which
/// one runs.
pub fn register_increment(registry: &KernelRegistry<IncrementFn>) -> Result<()> {
    register_kernels!(registry, INCREMENT => {
        Neon => increment_neon,
        Avx2 => increment_avx2,
        Avx => increment_avx,
        Sse42 => increment_sse42,
        Sse41 => increment_sse41,
        Ssse3 => increment_ssse3,
        Sse3 => increment_sse3,
        Sse2 => increment_sse2,
        Sse => increment_sse,
        _ => increment_fallback,
    })
}
