//! CPU kernel implementations
//!
//! Kernels operate on flat buffers. The generic entry points check
//! `T::DTYPE` and route f32/f64 buffers to the SIMD kernels in [`simd`];
//! every other element type, and every op without an exact vector form, runs
//! the scalar loop.

#![allow(unsafe_op_in_unsafe_fn)] // Kernels are already marked unsafe, inner unsafe is redundant

pub mod binary;
pub mod reduce;
pub mod simd;
pub mod unary;

pub use binary::binary_in_place;
pub use reduce::{argmax, argmin, max, mean, min, reduce, sum};
pub use unary::unary_in_place;
