//! AVX-512 unary kernels

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{unary_scalar_f32, unary_scalar_f64};
use crate::ops::UnaryOp;

const F32_LANES: usize = 16;
const F64_LANES: usize = 8;

/// AVX-512 square root for f32
///
/// # Safety
/// - CPU must support AVX-512F
/// - `a` and `out` must be valid for `len` elements
#[target_feature(enable = "avx512f")]
pub unsafe fn sqrt_f32(a: *const f32, out: *mut f32, len: usize) {
    let chunks = len / F32_LANES;
    for i in 0..chunks {
        let offset = i * F32_LANES;
        _mm512_storeu_ps(out.add(offset), _mm512_sqrt_ps(_mm512_loadu_ps(a.add(offset))));
    }
    let offset = chunks * F32_LANES;
    unary_scalar_f32(UnaryOp::Sqrt, a.add(offset), out.add(offset), len - offset);
}

/// AVX-512 square root for f64
///
/// # Safety
/// - CPU must support AVX-512F
/// - `a` and `out` must be valid for `len` elements
#[target_feature(enable = "avx512f")]
pub unsafe fn sqrt_f64(a: *const f64, out: *mut f64, len: usize) {
    let chunks = len / F64_LANES;
    for i in 0..chunks {
        let offset = i * F64_LANES;
        _mm512_storeu_pd(out.add(offset), _mm512_sqrt_pd(_mm512_loadu_pd(a.add(offset))));
    }
    let offset = chunks * F64_LANES;
    unary_scalar_f64(UnaryOp::Sqrt, a.add(offset), out.add(offset), len - offset);
}
