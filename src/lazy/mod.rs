//! Deferred execution engines
//!
//! - [`ElementwiseBatch`]: queued elementwise ops fused into one chunked,
//!   multithreaded pass over a core storage
//! - [`ReductionBatch`]: queued whole-array reductions run concurrently on a
//!   long-lived [`ThreadPool`](crate::runtime::cpu::ThreadPool)
//!
//! Both engines are single-writer: `execute` takes `&mut self`, and the
//! elementwise engine also takes the core as `&mut Storage<T>`. Operands are
//! `Arc` snapshots captured at enqueue time and never mutated by the engine.

mod elementwise;
mod reduction;

pub use elementwise::ElementwiseBatch;
pub use reduction::{CustomReduction, ReductionBatch};
