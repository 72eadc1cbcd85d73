//! The `increment_slice` operation: add 1.0 to every element of a slice.

use crate::arch::guarded_kernel;
use tierdispatch_core::{register_kernels, KernelRegistry, Result};
use wide::f32x4;

/// Operation name.
pub const INCREMENT_SLICE: &str = "increment_slice";

/// Kernel signature.
pub type SliceFn = fn(&mut [f32]);

/// Portable implementation on `wide::f32x4` lanes.
pub fn increment_slice_fallback(data: &mut [f32]) {
    const WIDTH: usize = 4;
    let n = data.len();
    let simd_end = n - (n % WIDTH);
    let ones = f32x4::splat(1.0);

    // SIMD part
    for chunk in data[..simd_end].chunks_exact_mut(WIDTH) {
        let v = f32x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&(v + ones).to_array());
    }

    // Scalar remainder
    for x in &mut data[simd_end..] {
        *x += 1.0;
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::arch::x86;

#[cfg(target_arch = "aarch64")]
use crate::arch::aarch64;

guarded_kernel! {
    /// SSE2 tier, four lanes per step.
    pub fn increment_slice_sse2(data: &mut [f32]);
    requires Sse2 on ("x86", "x86_64") => x86::increment_slice_sse2;
    otherwise increment_slice_fallback;
}

guarded_kernel! {
    /// AVX tier, eight lanes per step.
    pub fn increment_slice_avx(data: &mut [f32]);
    requires Avx on ("x86", "x86_64") => x86::increment_slice_avx;
    otherwise increment_slice_fallback;
}

guarded_kernel! {
    /// AVX2 tier, sixteen lanes per step.
    pub fn increment_slice_avx2(data: &mut [f32]);
    requires Avx2 on ("x86", "x86_64") => x86::increment_slice_avx2;
    otherwise increment_slice_fallback;
}

guarded_kernel! {
    /// NEON tier.
    pub fn increment_slice_neon(data: &mut [f32]);
    requires Neon on ("aarch64") => aarch64::increment_slice_neon;
    otherwise increment_slice_fallback;
}

/// Register every `increment_slice` tier.
pub fn register_increment_slice(registry: &KernelRegistry<SliceFn>) -> Result<()> {
    register_kernels!(registry, INCREMENT_SLICE => {
        Neon => increment_slice_neon,
        Avx2 => increment_slice_avx2,
        Avx => increment_slice_avx,
        Sse2 => increment_slice_sse2,
        _ => increment_slice_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fallback_with_remainder() {
        let mut data: Vec<f32> = (0..11).map(|i| i as f32).collect();
        increment_slice_fallback(&mut data);
        let expected: Vec<f32> = (1..12).map(|i| i as f32).collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn test_empty_slice() {
        let mut data: [f32; 0] = [];
        increment_slice_fallback(&mut data);
        increment_slice_avx2(&mut data);
        increment_slice_neon(&mut data);
    }

    #[test]
    fn test_every_tier_on_odd_length() {
        let tiers: [SliceFn; 4] = [
            increment_slice_sse2,
            increment_slice_avx,
            increment_slice_avx2,
            increment_slice_neon,
        ];
        for tier in tiers {
            let mut data = vec![2.5_f32; 37];
            tier(&mut data);
            assert!(data.iter().all(|&x| x == 3.5));
        }
    }
}
