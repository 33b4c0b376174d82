//! Binary operation kernels

use super::simd::binary as simd_binary;
use crate::dtype::{DType, Element};
use crate::ops::BinaryOp;

/// `out[i] = op(out[i], rhs[i])` over the whole slice
///
/// f32 and f64 buffers go through the SIMD dispatcher, which itself falls
/// back to scalar for ops without an exact vector form.
///
/// # Panics
/// If `rhs` is shorter than `out`.
#[inline]
pub fn binary_in_place<T: Element>(op: BinaryOp, out: &mut [T], rhs: &[T]) {
    let len = out.len();
    assert!(rhs.len() >= len, "rhs shorter than output");

    match T::DTYPE {
        DType::F32 => {
            if let (Ok(o), Ok(r)) = (
                bytemuck::try_cast_slice_mut::<T, f32>(out),
                bytemuck::try_cast_slice::<T, f32>(rhs),
            ) {
                // SAFETY: o and r are valid for len elements; the output is the
                // left operand, which the kernels allow to alias.
                unsafe { simd_binary::binary_f32(op, o.as_ptr(), r.as_ptr(), o.as_mut_ptr(), len) };
                return;
            }
        }
        DType::F64 => {
            if let (Ok(o), Ok(r)) = (
                bytemuck::try_cast_slice_mut::<T, f64>(out),
                bytemuck::try_cast_slice::<T, f64>(rhs),
            ) {
                // SAFETY: as above
                unsafe { simd_binary::binary_f64(op, o.as_ptr(), r.as_ptr(), o.as_mut_ptr(), len) };
                return;
            }
        }
        _ => {}
    }

    for (o, &r) in out.iter_mut().zip(rhs) {
        *o = op.apply(*o, r);
    }
}

/// Scalar binary kernel for f32, also used for SIMD tails
///
/// # Safety
/// - `a`, `b`, and `out` must be valid pointers to `len` elements
/// - `out` may alias `a` or `b` only if it is the same pointer
#[inline]
pub unsafe fn binary_scalar_f32(op: BinaryOp, a: *const f32, b: *const f32, out: *mut f32, len: usize) {
    for i in 0..len {
        *out.add(i) = op.apply(*a.add(i), *b.add(i));
    }
}

/// Scalar binary kernel for f64, also used for SIMD tails
///
/// # Safety
/// - `a`, `b`, and `out` must be valid pointers to `len` elements
/// - `out` may alias `a` or `b` only if it is the same pointer
#[inline]
pub unsafe fn binary_scalar_f64(op: BinaryOp, a: *const f64, b: *const f64, out: *mut f64, len: usize) {
    for i in 0..len {
        *out.add(i) = op.apply(*a.add(i), *b.add(i));
    }
}
