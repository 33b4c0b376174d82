//! NEON unary kernels for ARM64

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use super::super::{unary_scalar_f32, unary_scalar_f64};
use crate::ops::UnaryOp;

const F32_LANES: usize = 4;
const F64_LANES: usize = 2;

/// NEON square root for f32
///
/// # Safety
/// - `a` and `out` must be valid for `len` elements
#[target_feature(enable = "neon")]
pub unsafe fn sqrt_f32(a: *const f32, out: *mut f32, len: usize) {
    let chunks = len / F32_LANES;
    for i in 0..chunks {
        let offset = i * F32_LANES;
        vst1q_f32(out.add(offset), vsqrtq_f32(vld1q_f32(a.add(offset))));
    }
    let offset = chunks * F32_LANES;
    unary_scalar_f32(UnaryOp::Sqrt, a.add(offset), out.add(offset), len - offset);
}

/// NEON square root for f64
///
/// # Safety
/// - `a` and `out` must be valid for `len` elements
#[target_feature(enable = "neon")]
pub unsafe fn sqrt_f64(a: *const f64, out: *mut f64, len: usize) {
    let chunks = len / F64_LANES;
    for i in 0..chunks {
        let offset = i * F64_LANES;
        vst1q_f64(out.add(offset), vsqrtq_f64(vld1q_f64(a.add(offset))));
    }
    let offset = chunks * F64_LANES;
    unary_scalar_f64(UnaryOp::Sqrt, a.add(offset), out.add(offset), len - offset);
}
