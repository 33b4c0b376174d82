//! 512-bit kernels: 16 f32 or 8 f64 lanes per step
//!
//! Same loop shape as the AVX2 kernels; only the register width differs.

use std::arch::x86_64::*;

use super::{binary_scalar_f32, binary_scalar_f64};
use crate::ops::BinaryOp;

macro_rules! avx512_binary {
    ($name:ident, $t:ty, $lanes:expr, $load:ident, $store:ident, [$add:ident, $sub:ident, $mul:ident, $div:ident], $tail:ident) => {
        /// `out = a <op> b` over whole vectors, the remainder on the scalar path
        ///
        /// # Safety
        /// - CPU must support AVX-512F
        /// - All pointers must be valid for `len` elements
        #[target_feature(enable = "avx512f")]
        pub unsafe fn $name(op: BinaryOp, a: *const $t, b: *const $t, out: *mut $t, len: usize) {
            let vectorized = len - len % $lanes;
            let mut i = 0;
            while i < vectorized {
                let (va, vb) = ($load(a.add(i)), $load(b.add(i)));
                let v = match op {
                    BinaryOp::Add => $add(va, vb),
                    BinaryOp::Sub => $sub(va, vb),
                    BinaryOp::Mul => $mul(va, vb),
                    BinaryOp::Div => $div(va, vb),
                    BinaryOp::Pow => break,
                };
                $store(out.add(i), v);
                i += $lanes;
            }
            $tail(op, a.add(i), b.add(i), out.add(i), len - i);
        }
    };
}

avx512_binary!(
    binary_f32, f32, 16, _mm512_loadu_ps, _mm512_storeu_ps,
    [_mm512_add_ps, _mm512_sub_ps, _mm512_mul_ps, _mm512_div_ps],
    binary_scalar_f32
);
avx512_binary!(
    binary_f64, f64, 8, _mm512_loadu_pd, _mm512_storeu_pd,
    [_mm512_add_pd, _mm512_sub_pd, _mm512_mul_pd, _mm512_div_pd],
    binary_scalar_f64
);
