//! AArch64 kernel bodies.

use std::arch::aarch64::*;

/// # Safety
///
/// The CPU must support NEON.
#[target_feature(enable = "neon")]
pub unsafe fn increment_neon(arr: &mut [f32; 4]) {
    let v = vld1q_f32(arr.as_ptr());
    vst1q_f32(arr.as_mut_ptr(), vaddq_f32(v, vdupq_n_f32(1.0)));
}

/// # Safety
///
/// The CPU must support NEON.
#[target_feature(enable = "neon")]
pub unsafe fn increment_slice_neon(data: &mut [f32]) {
    let ones = vdupq_n_f32(1.0);
    let mut chunks = data.chunks_exact_mut(4);
    for chunk in &mut chunks {
        let v = vld1q_f32(chunk.as_ptr());
        vst1q_f32(chunk.as_mut_ptr(), vaddq_f32(v, ones));
    }
    for x in chunks.into_remainder() {
        *x += 1.0;
    }
}
