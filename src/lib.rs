//! # ftensor
//!
//! **Deferred-execution n-dimensional arrays for Rust.**
//!
//! Elementwise arithmetic is queued instead of computed. When a batch is
//! evaluated, every queued op runs in one pass over the data: the index range
//! is cut into chunks that worker threads claim from an atomic cursor, and
//! within each chunk the ops apply in queue order through exact SIMD kernels.
//! Whole-array reductions are batched too and run concurrently on a
//! long-lived thread pool.
//!
//! ## Features
//!
//! - **Broadcasting**: NumPy rules, resolved once per batch
//! - **Lazy elementwise ops**: add, sub, mul, div, pow, sqrt, sin, cos, custom
//! - **Reductions**: sum, mean, max, min, argmax, argmin, len
//! - **SIMD**: AVX-512, AVX2 and NEON kernels, detected at runtime
//! - **Dtypes**: f64, f32, i64, i32, u32, u8
//!
//! ## Quick Start
//!
//! ```rust
//! use ftensor::prelude::*;
//!
//! # fn main() -> ftensor::error::Result<()> {
//! let x = Tensor::<f64>::random(-1.0, 1.0, &[20])?;
//! let y = Tensor::<f64>::random(-1.0, 1.0, &[10, 2])?;
//!
//! let e = (&x + &y.reshape(&[20])?).evaluate()?;
//! assert_eq!(e.shape(), &[20]);
//!
//! let stats = e.stats(&[Reduction::Max, Reduction::Min])?;
//! assert!(stats[0] >= stats[1]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): parallel broadcast materialization
//!
//! ## Environment
//!
//! - `FTENSOR_NUM_THREADS`: worker threads for elementwise batches and the
//!   global reduction pool
//! - `FTENSOR_MIN_CHUNK`: minimum elements per elementwise chunk

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod lazy;
pub mod ops;
pub mod runtime;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::lazy::{ElementwiseBatch, ReductionBatch};
    pub use crate::ops::{BinaryOp, ElementwiseOp, Reduction, UnaryOp};
    pub use crate::runtime::ParallelismConfig;
    pub use crate::tensor::{Storage, Tensor, broadcast_shapes, materialize};
}
