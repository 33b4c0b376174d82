//! AVX2 unary kernels

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{unary_scalar_f32, unary_scalar_f64};
use crate::ops::UnaryOp;

const F32_LANES: usize = 8;
const F64_LANES: usize = 4;

/// AVX2 square root for f32
///
/// # Safety
/// - CPU must support AVX2
/// - `a` and `out` must be valid for `len` elements
#[target_feature(enable = "avx2")]
pub unsafe fn sqrt_f32(a: *const f32, out: *mut f32, len: usize) {
    let chunks = len / F32_LANES;
    for i in 0..chunks {
        let offset = i * F32_LANES;
        _mm256_storeu_ps(out.add(offset), _mm256_sqrt_ps(_mm256_loadu_ps(a.add(offset))));
    }
    let offset = chunks * F32_LANES;
    unary_scalar_f32(UnaryOp::Sqrt, a.add(offset), out.add(offset), len - offset);
}

/// AVX2 square root for f64
///
/// # Safety
/// - CPU must support AVX2
/// - `a` and `out` must be valid for `len` elements
#[target_feature(enable = "avx2")]
pub unsafe fn sqrt_f64(a: *const f64, out: *mut f64, len: usize) {
    let chunks = len / F64_LANES;
    for i in 0..chunks {
        let offset = i * F64_LANES;
        _mm256_storeu_pd(out.add(offset), _mm256_sqrt_pd(_mm256_loadu_pd(a.add(offset))));
    }
    let offset = chunks * F64_LANES;
    unary_scalar_f64(UnaryOp::Sqrt, a.add(offset), out.add(offset), len - offset);
}
