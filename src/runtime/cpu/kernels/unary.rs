//! Unary operation kernels

use super::simd::unary as simd_unary;
use crate::dtype::{DType, Element};
use crate::ops::UnaryOp;

/// `out[i] = op(out[i])` over the whole slice
#[inline]
pub fn unary_in_place<T: Element>(op: UnaryOp, out: &mut [T]) {
    let len = out.len();
    match T::DTYPE {
        DType::F32 => {
            if let Ok(o) = bytemuck::try_cast_slice_mut::<T, f32>(out) {
                // SAFETY: in-place, input and output are the same pointer
                unsafe { simd_unary::unary_f32(op, o.as_ptr(), o.as_mut_ptr(), len) };
                return;
            }
        }
        DType::F64 => {
            if let Ok(o) = bytemuck::try_cast_slice_mut::<T, f64>(out) {
                // SAFETY: in-place, input and output are the same pointer
                unsafe { simd_unary::unary_f64(op, o.as_ptr(), o.as_mut_ptr(), len) };
                return;
            }
        }
        _ => {}
    }

    for o in out.iter_mut() {
        *o = op.apply(*o);
    }
}

/// Scalar unary kernel for f32
///
/// # Safety
/// - `a` and `out` must be valid pointers to `len` elements
/// - `out` may alias `a` only if it is the same pointer
#[inline]
pub unsafe fn unary_scalar_f32(op: UnaryOp, a: *const f32, out: *mut f32, len: usize) {
    for i in 0..len {
        *out.add(i) = op.apply(*a.add(i));
    }
}

/// Scalar unary kernel for f64
///
/// # Safety
/// - `a` and `out` must be valid pointers to `len` elements
/// - `out` may alias `a` only if it is the same pointer
#[inline]
pub unsafe fn unary_scalar_f64(op: UnaryOp, a: *const f64, out: *mut f64, len: usize) {
    for i in 0..len {
        *out.add(i) = op.apply(*a.add(i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_in_place() {
        let mut v: Vec<f64> = (0..50).map(|x| x as f64).collect();
        unary_in_place(UnaryOp::Sqrt, &mut v);
        assert_eq!(v[49], 7.0);
        assert_eq!(v[16], 4.0);

        let mut ints = vec![0i64, 1, 4, 10];
        unary_in_place(UnaryOp::Sqrt, &mut ints);
        assert_eq!(ints, vec![0, 1, 2, 3]);
    }
}
