//! Whole-buffer reduction kernels
//!
//! Each kernel is a single pass over a flat buffer. Parallelism comes from
//! running several reductions at once, never from splitting one.

use super::simd::reduce as simd_reduce;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::ops::Reduction;

/// Run a built-in reduction, casting index and count results to `T`
///
/// Fails with `InvalidArgument` when `r` has no value for an empty buffer.
pub fn reduce<T: Element>(r: Reduction, data: &[T]) -> Result<T> {
    let value = match r {
        Reduction::Sum => Some(sum(data)),
        Reduction::Mean => Some(mean(data)),
        Reduction::Max => max(data),
        Reduction::Min => min(data),
        Reduction::ArgMax => argmax(data).map(index_to_element),
        Reduction::ArgMin => argmin(data).map(index_to_element),
        Reduction::Len => Some(index_to_element(data.len())),
    };
    value.ok_or_else(|| Error::invalid_argument("storage", format!("{} of an empty array", r.name())))
}

/// Sum of all elements
///
/// f32/f64 use the SIMD horizontal sum. Integer types accumulate exactly in
/// `i128` and wrap on conversion back, like repeated elementwise `Add`.
pub fn sum<T: Element>(data: &[T]) -> T {
    match T::DTYPE {
        DType::F32 => {
            if let Ok(s) = bytemuck::try_cast_slice::<T, f32>(data) {
                // SAFETY: s is a valid slice of s.len() elements
                let total = unsafe { simd_reduce::sum_f32(s.as_ptr(), s.len()) };
                return T::from_f64(total as f64);
            }
        }
        DType::F64 => {
            if let Ok(s) = bytemuck::try_cast_slice::<T, f64>(data) {
                // SAFETY: s is a valid slice of s.len() elements
                return T::from_f64(unsafe { simd_reduce::sum_f64(s.as_ptr(), s.len()) });
            }
        }
        _ => {}
    }
    T::from_i128(wide_sum(data))
}

// A slice holds under 2^63 elements of magnitude at most 2^64, so i128 never overflows
fn wide_sum<T: Element>(data: &[T]) -> i128 {
    data.iter().map(|v| v.to_i128()).sum()
}

/// Arithmetic mean; NaN (or 0 for integer types) when empty
///
/// Integer means divide the exact sum and truncate toward zero.
pub fn mean<T: Element>(data: &[T]) -> T {
    if T::DTYPE.is_float() {
        return T::from_f64(sum(data).to_f64() / data.len() as f64);
    }
    match data.len() {
        0 => T::zero(),
        n => T::from_i128(wide_sum(data) / n as i128),
    }
}

/// Largest element, `None` when empty
pub fn max<T: Element>(data: &[T]) -> Option<T> {
    argmax(data).map(|i| data[i])
}

/// Smallest element, `None` when empty
pub fn min<T: Element>(data: &[T]) -> Option<T> {
    argmin(data).map(|i| data[i])
}

/// Flat index of the largest element; ties resolve to the first occurrence
pub fn argmax<T: Element>(data: &[T]) -> Option<usize> {
    extremum(data, |candidate, best| candidate > best)
}

/// Flat index of the smallest element; ties resolve to the first occurrence
pub fn argmin<T: Element>(data: &[T]) -> Option<usize> {
    extremum(data, |candidate, best| candidate < best)
}

#[inline]
fn extremum<T: Element>(data: &[T], better: impl Fn(T, T) -> bool) -> Option<usize> {
    let (first, rest) = data.split_first()?;
    let mut best = *first;
    let mut best_idx = 0;
    for (i, &v) in rest.iter().enumerate() {
        // Strict comparison keeps the earliest index on ties
        if better(v, best) {
            best = v;
            best_idx = i + 1;
        }
    }
    Some(best_idx)
}

#[inline]
fn index_to_element<T: Element>(i: usize) -> T {
    T::from_f64(i as f64)
}
