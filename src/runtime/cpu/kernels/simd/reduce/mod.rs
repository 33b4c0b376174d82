//! SIMD-accelerated whole-buffer summation
//!
//! Lane-wise accumulation followed by a horizontal add. The association order
//! differs from a left-to-right scalar loop, so float sums may differ from the
//! scalar result in the last bits.

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
mod avx512;

#[cfg(target_arch = "aarch64")]
mod aarch64 {
    pub mod neon;
}

use super::{SimdLevel, detect_simd};

/// Minimum length before the vector path pays off
const SIMD_THRESHOLD: usize = 64;

/// Sum of `len` f32 values starting at `a`
///
/// # Safety
/// `a` must be valid for reads of `len` elements
#[inline]
pub unsafe fn sum_f32(a: *const f32, len: usize) -> f32 {
    let level = detect_simd();

    if len < SIMD_THRESHOLD || level == SimdLevel::Scalar {
        return sum_scalar_f32(a, len);
    }

    #[cfg(target_arch = "x86_64")]
    return match level {
        SimdLevel::Avx512 => avx512::sum_f32(a, len),
        SimdLevel::Avx2Fma => avx2::sum_f32(a, len),
        _ => sum_scalar_f32(a, len),
    };

    #[cfg(target_arch = "aarch64")]
    return match level {
        SimdLevel::Neon => aarch64::neon::sum_f32(a, len),
        _ => sum_scalar_f32(a, len),
    };

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    sum_scalar_f32(a, len)
}

/// Sum of `len` f64 values starting at `a`
///
/// # Safety
/// `a` must be valid for reads of `len` elements
#[inline]
pub unsafe fn sum_f64(a: *const f64, len: usize) -> f64 {
    let level = detect_simd();

    if len < SIMD_THRESHOLD || level == SimdLevel::Scalar {
        return sum_scalar_f64(a, len);
    }

    #[cfg(target_arch = "x86_64")]
    return match level {
        SimdLevel::Avx512 => avx512::sum_f64(a, len),
        SimdLevel::Avx2Fma => avx2::sum_f64(a, len),
        _ => sum_scalar_f64(a, len),
    };

    #[cfg(target_arch = "aarch64")]
    return match level {
        SimdLevel::Neon => aarch64::neon::sum_f64(a, len),
        _ => sum_scalar_f64(a, len),
    };

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    sum_scalar_f64(a, len)
}

/// Scalar f32 sum, also used for SIMD tails
///
/// # Safety
/// `a` must be valid for reads of `len` elements
#[inline]
pub unsafe fn sum_scalar_f32(a: *const f32, len: usize) -> f32 {
    std::slice::from_raw_parts(a, len).iter().sum()
}

/// Scalar f64 sum, also used for SIMD tails
///
/// # Safety
/// `a` must be valid for reads of `len` elements
#[inline]
pub unsafe fn sum_scalar_f64(a: *const f64, len: usize) -> f64 {
    std::slice::from_raw_parts(a, len).iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_f32_exact_on_integers() {
        // Small integers are exact in f32 regardless of association order
        let a: Vec<f32> = (0..1003).map(|x| (x % 17) as f32).collect();
        let expected: f32 = a.iter().sum();
        assert_eq!(unsafe { sum_f32(a.as_ptr(), a.len()) }, expected);
    }

    #[test]
    fn test_sum_f64_close_to_scalar() {
        let a: Vec<f64> = (0..777).map(|x| (x as f64 * 0.37).sin()).collect();
        let expected: f64 = a.iter().sum();
        let got = unsafe { sum_f64(a.as_ptr(), a.len()) };
        assert!((got - expected).abs() < 1e-9, "{} vs {}", got, expected);
    }

    #[test]
    fn test_sum_short_and_empty() {
        let a = [1.5f32, 2.5, 3.0];
        assert_eq!(unsafe { sum_f32(a.as_ptr(), a.len()) }, 7.0);
        let empty: [f64; 0] = [];
        assert_eq!(unsafe { sum_f64(empty.as_ptr(), 0) }, 0.0);
    }
}
