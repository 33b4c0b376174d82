//! NEON summation kernels for ARM64

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use super::super::{sum_scalar_f32, sum_scalar_f64};

const F32_LANES: usize = 4;
const F64_LANES: usize = 2;

/// NEON sum for f32
#[target_feature(enable = "neon")]
pub unsafe fn sum_f32(a: *const f32, len: usize) -> f32 {
    let chunks = len / F32_LANES;
    let mut acc = vdupq_n_f32(0.0);
    for i in 0..chunks {
        acc = vaddq_f32(acc, vld1q_f32(a.add(i * F32_LANES)));
    }
    let offset = chunks * F32_LANES;
    vaddvq_f32(acc) + sum_scalar_f32(a.add(offset), len - offset)
}

/// NEON sum for f64
#[target_feature(enable = "neon")]
pub unsafe fn sum_f64(a: *const f64, len: usize) -> f64 {
    let chunks = len / F64_LANES;
    let mut acc = vdupq_n_f64(0.0);
    for i in 0..chunks {
        acc = vaddq_f64(acc, vld1q_f64(a.add(i * F64_LANES)));
    }
    let offset = chunks * F64_LANES;
    vaddvq_f64(acc) + sum_scalar_f64(a.add(offset), len - offset)
}
