//! SIMD-accelerated unary operations
//!
//! Only sqrt is vectorized: it is correctly rounded in both forms. Sin and
//! cos run on the scalar path.

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
mod avx512;

#[cfg(target_arch = "aarch64")]
mod aarch64 {
    pub mod neon;
}

use super::{SimdLevel, detect_simd};
use crate::ops::UnaryOp;

pub use crate::runtime::cpu::kernels::unary::{unary_scalar_f32, unary_scalar_f64};

/// Minimum elements to justify SIMD overhead
const SIMD_THRESHOLD: usize = 32;

/// SIMD unary operation for f32: `out[i] = op(a[i])`
///
/// # Safety
/// - `a` and `out` must be valid pointers to `len` elements
/// - `out` must not overlap with `a` unless they are the same pointer
#[inline]
pub unsafe fn unary_f32(op: UnaryOp, a: *const f32, out: *mut f32, len: usize) {
    let level = detect_simd();

    if len < SIMD_THRESHOLD || level == SimdLevel::Scalar || !op.has_simd() {
        unary_scalar_f32(op, a, out, len);
        return;
    }

    #[cfg(target_arch = "x86_64")]
    match level {
        SimdLevel::Avx512 => avx512::sqrt_f32(a, out, len),
        SimdLevel::Avx2Fma => avx2::sqrt_f32(a, out, len),
        _ => unary_scalar_f32(op, a, out, len),
    }

    #[cfg(target_arch = "aarch64")]
    match level {
        SimdLevel::Neon => aarch64::neon::sqrt_f32(a, out, len),
        _ => unary_scalar_f32(op, a, out, len),
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    unary_scalar_f32(op, a, out, len);
}

/// SIMD unary operation for f64: `out[i] = op(a[i])`
///
/// # Safety
/// - `a` and `out` must be valid pointers to `len` elements
/// - `out` must not overlap with `a` unless they are the same pointer
#[inline]
pub unsafe fn unary_f64(op: UnaryOp, a: *const f64, out: *mut f64, len: usize) {
    let level = detect_simd();

    if len < SIMD_THRESHOLD || level == SimdLevel::Scalar || !op.has_simd() {
        unary_scalar_f64(op, a, out, len);
        return;
    }

    #[cfg(target_arch = "x86_64")]
    match level {
        SimdLevel::Avx512 => avx512::sqrt_f64(a, out, len),
        SimdLevel::Avx2Fma => avx2::sqrt_f64(a, out, len),
        _ => unary_scalar_f64(op, a, out, len),
    }

    #[cfg(target_arch = "aarch64")]
    match level {
        SimdLevel::Neon => aarch64::neon::sqrt_f64(a, out, len),
        _ => unary_scalar_f64(op, a, out, len),
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    unary_scalar_f64(op, a, out, len);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqrt_matches_scalar_bits() {
        let a: Vec<f32> = (0..131).map(|x| x as f32 * 0.731 + 0.01).collect();
        let mut out = vec![0.0f32; a.len()];
        unsafe { unary_f32(UnaryOp::Sqrt, a.as_ptr(), out.as_mut_ptr(), a.len()) }
        for i in 0..a.len() {
            assert_eq!(out[i].to_bits(), UnaryOp::Sqrt.apply(a[i]).to_bits(), "at {}", i);
        }

        let a: Vec<f64> = (0..67).map(|x| x as f64 * 1.37).collect();
        let mut out = vec![0.0f64; a.len()];
        unsafe { unary_f64(UnaryOp::Sqrt, a.as_ptr(), out.as_mut_ptr(), a.len()) }
        for i in 0..a.len() {
            assert_eq!(out[i].to_bits(), a[i].sqrt().to_bits(), "at {}", i);
        }
    }

    #[test]
    fn test_trig_uses_scalar() {
        let a: Vec<f64> = (0..40).map(|x| x as f64 * 0.1).collect();
        let mut out = vec![0.0f64; a.len()];
        unsafe { unary_f64(UnaryOp::Cos, a.as_ptr(), out.as_mut_ptr(), a.len()) }
        for i in 0..a.len() {
            assert_eq!(out[i], a[i].cos());
        }
    }
}
