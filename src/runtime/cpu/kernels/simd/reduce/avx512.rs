//! AVX-512 summation kernels

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{sum_scalar_f32, sum_scalar_f64};

const F32_LANES: usize = 16;
const F64_LANES: usize = 8;

/// AVX-512 sum for f32
#[target_feature(enable = "avx512f")]
pub unsafe fn sum_f32(a: *const f32, len: usize) -> f32 {
    let chunks = len / F32_LANES;
    let mut acc = _mm512_setzero_ps();
    for i in 0..chunks {
        acc = _mm512_add_ps(acc, _mm512_loadu_ps(a.add(i * F32_LANES)));
    }
    let offset = chunks * F32_LANES;
    _mm512_reduce_add_ps(acc) + sum_scalar_f32(a.add(offset), len - offset)
}

/// AVX-512 sum for f64
#[target_feature(enable = "avx512f")]
pub unsafe fn sum_f64(a: *const f64, len: usize) -> f64 {
    let chunks = len / F64_LANES;
    let mut acc = _mm512_setzero_pd();
    for i in 0..chunks {
        acc = _mm512_add_pd(acc, _mm512_loadu_pd(a.add(i * F64_LANES)));
    }
    let offset = chunks * F64_LANES;
    _mm512_reduce_add_pd(acc) + sum_scalar_f64(a.add(offset), len - offset)
}
