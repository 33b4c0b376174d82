//! 128-bit NEON kernels: 4 f32 or 2 f64 lanes per step

use std::arch::aarch64::*;

use super::super::{binary_scalar_f32, binary_scalar_f64};
use crate::ops::BinaryOp;

macro_rules! neon_binary {
    ($name:ident, $t:ty, $lanes:expr, $load:ident, $store:ident, [$add:ident, $sub:ident, $mul:ident, $div:ident], $tail:ident) => {
        /// `out = a <op> b` over whole vectors, the remainder on the scalar path
        ///
        /// # Safety
        /// - All pointers must be valid for `len` elements
        #[target_feature(enable = "neon")]
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

neon_binary!(
    binary_f32, f32, 4, vld1q_f32, vst1q_f32,
    [vaddq_f32, vsubq_f32, vmulq_f32, vdivq_f32],
    binary_scalar_f32
);
neon_binary!(
    binary_f64, f64, 2, vld1q_f64, vst1q_f64,
    [vaddq_f64, vsubq_f64, vmulq_f64, vdivq_f64],
    binary_scalar_f64
);
