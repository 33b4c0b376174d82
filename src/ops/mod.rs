//! Operation descriptors queued by the lazy engines
//!
//! Elementwise operations are tagged ([`BinaryOp`], [`UnaryOp`]) so the CPU
//! kernels can pick a vectorized implementation of exactly the requested
//! operation; anything else is an opaque [`ElementwiseOp::Custom`] closure run
//! on the scalar path.

mod arithmetic;
mod reduce;

pub use arithmetic::{BinaryOp, CustomFn, ElementwiseOp, UnaryOp};
pub use reduce::Reduction;
