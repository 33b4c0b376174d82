//! AVX2 summation kernels
//!
//! AVX2 has no _mm256_reduce_* intrinsics, so the final lane fold is manual.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{sum_scalar_f32, sum_scalar_f64};

const F32_LANES: usize = 8;
const F64_LANES: usize = 4;

/// AVX2 sum for f32
#[target_feature(enable = "avx2")]
pub unsafe fn sum_f32(a: *const f32, len: usize) -> f32 {
    let chunks = len / F32_LANES;
    let mut acc = _mm256_setzero_ps();
    for i in 0..chunks {
        acc = _mm256_add_ps(acc, _mm256_loadu_ps(a.add(i * F32_LANES)));
    }
    let offset = chunks * F32_LANES;
    hsum_f32(acc) + sum_scalar_f32(a.add(offset), len - offset)
}

/// AVX2 sum for f64
#[target_feature(enable = "avx2")]
pub unsafe fn sum_f64(a: *const f64, len: usize) -> f64 {
    let chunks = len / F64_LANES;
    let mut acc = _mm256_setzero_pd();
    for i in 0..chunks {
        acc = _mm256_add_pd(acc, _mm256_loadu_pd(a.add(i * F64_LANES)));
    }
    let offset = chunks * F64_LANES;
    hsum_f64(acc) + sum_scalar_f64(a.add(offset), len - offset)
}

/// Horizontal sum of 8 f32s in __m256
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum_f32(v: __m256) -> f32 {
    let high = _mm256_extractf128_ps(v, 1);
    let low = _mm256_castps256_ps128(v);
    let sum128 = _mm_add_ps(low, high);

    let shuf = _mm_movehdup_ps(sum128); // [1,1,3,3]
    let sum64 = _mm_add_ps(sum128, shuf);
    let shuf2 = _mm_movehl_ps(sum64, sum64);
    let sum32 = _mm_add_ss(sum64, shuf2);

    _mm_cvtss_f32(sum32)
}

/// Horizontal sum of 4 f64s in __m256d
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum_f64(v: __m256d) -> f64 {
    let high = _mm256_extractf128_pd(v, 1);
    let low = _mm256_castpd256_pd128(v);
    let sum128 = _mm_add_pd(low, high);

    let shuf = _mm_unpackhi_pd(sum128, sum128);
    _mm_cvtsd_f64(_mm_add_sd(sum128, shuf))
}
