//! SIMD-accelerated binary operations
//!
//! Vector kernels cover add, sub, mul and div. Pow runs on the scalar path
//! because a vectorized exp/log approximation would round differently.

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
mod avx512;

#[cfg(target_arch = "aarch64")]
mod aarch64 {
    pub mod neon;
}

use super::{SimdLevel, detect_simd};
use crate::ops::BinaryOp;

pub use crate::runtime::cpu::kernels::binary::{binary_scalar_f32, binary_scalar_f64};

/// Minimum elements to justify SIMD overhead
const SIMD_THRESHOLD: usize = 32;

/// SIMD binary operation for f32: `out[i] = a[i] <op> b[i]`
///
/// # Safety
/// - `a`, `b`, and `out` must be valid pointers to `len` elements
/// - `out` must not overlap with `a` or `b` unless they are the same pointer
#[inline]
pub unsafe fn binary_f32(op: BinaryOp, a: *const f32, b: *const f32, out: *mut f32, len: usize) {
    let level = detect_simd();

    if len < SIMD_THRESHOLD || level == SimdLevel::Scalar || !op.has_simd() {
        binary_scalar_f32(op, a, b, out, len);
        return;
    }

    #[cfg(target_arch = "x86_64")]
    match level {
        SimdLevel::Avx512 => avx512::binary_f32(op, a, b, out, len),
        SimdLevel::Avx2Fma => avx2::binary_f32(op, a, b, out, len),
        _ => binary_scalar_f32(op, a, b, out, len),
    }

    #[cfg(target_arch = "aarch64")]
    match level {
        SimdLevel::Neon => aarch64::neon::binary_f32(op, a, b, out, len),
        _ => binary_scalar_f32(op, a, b, out, len),
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    binary_scalar_f32(op, a, b, out, len);
}

/// SIMD binary operation for f64: `out[i] = a[i] <op> b[i]`
///
/// # Safety
/// - `a`, `b`, and `out` must be valid pointers to `len` elements
/// - `out` must not overlap with `a` or `b` unless they are the same pointer
#[inline]
pub unsafe fn binary_f64(op: BinaryOp, a: *const f64, b: *const f64, out: *mut f64, len: usize) {
    let level = detect_simd();

    if len < SIMD_THRESHOLD || level == SimdLevel::Scalar || !op.has_simd() {
        binary_scalar_f64(op, a, b, out, len);
        return;
    }

    #[cfg(target_arch = "x86_64")]
    match level {
        SimdLevel::Avx512 => avx512::binary_f64(op, a, b, out, len),
        SimdLevel::Avx2Fma => avx2::binary_f64(op, a, b, out, len),
        _ => binary_scalar_f64(op, a, b, out, len),
    }

    #[cfg(target_arch = "aarch64")]
    match level {
        SimdLevel::Neon => aarch64::neon::binary_f64(op, a, b, out, len),
        _ => binary_scalar_f64(op, a, b, out, len),
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    binary_scalar_f64(op, a, b, out, len);
}
