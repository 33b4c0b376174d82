//! CPU execution backend
//!
//! Two concurrency regimes live here:
//!
//! - [`workers`]: threads spawned per elementwise `execute`, pulling disjoint
//!   chunks from an atomic cursor and joined before `execute` returns.
//! - [`ThreadPool`]: persistent workers fed through a mutex/condvar guarded
//!   queue, used for batches of independent whole-array reductions.

pub mod kernels;
mod pool;
pub mod workers;

pub use kernels::simd::{SimdLevel, detect_simd};
pub use pool::{ThreadPool, global_pool};
