//! Tensor types and operations
//!
//! - [`Storage`]: owned contiguous buffer with shape and row-major strides
//! - [`broadcast_shapes`], [`broadcast_all`], [`materialize`]: broadcasting
//! - [`Tensor`]: lazy facade pairing a storage snapshot with pending ops

mod broadcast;
mod core;
mod shape;
mod storage;
mod strides;

pub use broadcast::{BroadcastIndexer, broadcast_all, broadcast_shapes, materialize};
pub use core::Tensor;
pub use shape::Shape;
pub use storage::Storage;
pub use strides::Strides;
