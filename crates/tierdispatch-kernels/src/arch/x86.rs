//! x86 and x86_64 kernel bodies.
//!
//! Each function is compiled with its tier's target feature enabled and must
//! only run on a CPU that has it. The safe wrappers in the parent modules
//! check the host capabilities before calling in.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Four-lane add with plain SSE.
///
/// # Safety
///
/// The CPU must support SSE.
#[target_feature(enable = "sse")]
pub unsafe fn increment_sse(arr: &mut [f32; 4]) {
    let v = _mm_loadu_ps(arr.as_ptr());
    _mm_storeu_ps(arr.as_mut_ptr(), _mm_add_ps(v, _mm_set1_ps(1.0)));
}

/// Widens each half to a pair of doubles, adds, and narrows back.
///
/// Adding 1.0 to an f32 in double precision and rounding once to single
/// precision gives the same bits as the single-precision add.
///
/// # Safety
///
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
pub unsafe fn increment_sse2(arr: &mut [f32; 4]) {
    let v = _mm_loadu_ps(arr.as_ptr());
    let one = _mm_set1_pd(1.0);
    let lo = _mm_add_pd(_mm_cvtps_pd(v), one);
    let hi = _mm_add_pd(_mm_cvtps_pd(_mm_movehl_ps(v, v)), one);
    let r = _mm_movelh_ps(_mm_cvtpd_ps(lo), _mm_cvtpd_ps(hi));
    _mm_storeu_ps(arr.as_mut_ptr(), r);
}

/// `addsub` against alternating -1/+1: even lanes subtract -1, odd lanes add 1.
///
/// # Safety
///
/// The CPU must support SSE3.
#[target_feature(enable = "sse3")]
pub unsafe fn increment_sse3(arr: &mut [f32; 4]) {
    let v = _mm_loadu_ps(arr.as_ptr());
    let signs = _mm_setr_ps(-1.0, 1.0, -1.0, 1.0);
    _mm_storeu_ps(arr.as_mut_ptr(), _mm_addsub_ps(v, signs));
}

/// Routes the lanes through an identity byte shuffle before the add.
///
/// # Safety
///
/// The CPU must support SSSE3.
#[target_feature(enable = "ssse3")]
pub unsafe fn increment_ssse3(arr: &mut [f32; 4]) {
    let identity = _mm_setr_epi8(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15);
    let bytes = _mm_shuffle_epi8(_mm_castps_si128(_mm_loadu_ps(arr.as_ptr())), identity);
    let r = _mm_add_ps(_mm_castsi128_ps(bytes), _mm_set1_ps(1.0));
    _mm_storeu_ps(arr.as_mut_ptr(), r);
}

/// Blends the incremented lanes over the originals.
///
/// # Safety
///
/// The CPU must support SSE4.1.
#[target_feature(enable = "sse4.1")]
pub unsafe fn increment_sse41(arr: &mut [f32; 4]) {
    let v = _mm_loadu_ps(arr.as_ptr());
    let sum = _mm_add_ps(v, _mm_set1_ps(1.0));
    _mm_storeu_ps(arr.as_mut_ptr(), _mm_blend_ps::<0b1111>(v, sum));
}

/// SSE4.2 adds only string and CRC instructions; the float path is the SSE
/// add compiled with SSE4.2 enabled.
///
/// # Safety
///
/// The CPU must support SSE4.2.
#[target_feature(enable = "sse4.2")]
pub unsafe fn increment_sse42(arr: &mut [f32; 4]) {
    let v = _mm_loadu_ps(arr.as_ptr());
    _mm_storeu_ps(arr.as_mut_ptr(), _mm_add_ps(v, _mm_set1_ps(1.0)));
}

/// Widens all four lanes into one 256-bit double vector.
///
/// # Safety
///
/// The CPU must support AVX.
#[target_feature(enable = "avx")]
pub unsafe fn increment_avx(arr: &mut [f32; 4]) {
    let wide = _mm256_cvtps_pd(_mm_loadu_ps(arr.as_ptr()));
    let r = _mm256_cvtpd_ps(_mm256_add_pd(wide, _mm256_set1_pd(1.0)));
    _mm_storeu_ps(arr.as_mut_ptr(), r);
}

/// Builds the ones vector with a register broadcast.
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn increment_avx2(arr: &mut [f32; 4]) {
    let ones = _mm_broadcastss_ps(_mm_set_ss(1.0));
    let v = _mm_loadu_ps(arr.as_ptr());
    _mm_storeu_ps(arr.as_mut_ptr(), _mm_add_ps(v, ones));
}

/// # Safety
///
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
pub unsafe fn increment_slice_sse2(data: &mut [f32]) {
    let ones = _mm_set1_ps(1.0);
    let mut chunks = data.chunks_exact_mut(4);
    for chunk in &mut chunks {
        let v = _mm_loadu_ps(chunk.as_ptr());
        _mm_storeu_ps(chunk.as_mut_ptr(), _mm_add_ps(v, ones));
    }
    for x in chunks.into_remainder() {
        *x += 1.0;
    }
}

/// # Safety
///
/// The CPU must support AVX.
#[target_feature(enable = "avx")]
pub unsafe fn increment_slice_avx(data: &mut [f32]) {
    let ones = _mm256_set1_ps(1.0);
    let mut chunks = data.chunks_exact_mut(8);
    for chunk in &mut chunks {
        let v = _mm256_loadu_ps(chunk.as_ptr());
        _mm256_storeu_ps(chunk.as_mut_ptr(), _mm256_add_ps(v, ones));
    }
    for x in chunks.into_remainder() {
        *x += 1.0;
    }
}

/// Two 256-bit vectors per iteration.
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn increment_slice_avx2(data: &mut [f32]) {
    let ones = _mm256_broadcastss_ps(_mm_set_ss(1.0));
    let mut chunks = data.chunks_exact_mut(16);
    for chunk in &mut chunks {
        let ptr = chunk.as_mut_ptr();
        let a = _mm256_loadu_ps(ptr);
        let b = _mm256_loadu_ps(ptr.add(8));
        _mm256_storeu_ps(ptr, _mm256_add_ps(a, ones));
        _mm256_storeu_ps(ptr.add(8), _mm256_add_ps(b, ones));
    }
    for x in chunks.into_remainder() {
        *x += 1.0;
    }
}
