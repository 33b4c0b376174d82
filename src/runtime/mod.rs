//! Execution resources for the lazy engines
//!
//! ```text
//! runtime
//! ├── ParallelismConfig   (thread count / chunk floor, resolved once)
//! └── cpu
//!     ├── workers         (ephemeral scoped workers, atomic chunk cursor)
//!     ├── ThreadPool      (long-lived workers, mutex + condvar queue)
//!     └── kernels         (scalar + SIMD elementwise and reduction kernels)
//! ```

pub mod cpu;
mod parallelism;

pub use parallelism::{
    DEFAULT_MIN_CHUNK_SIZE, FALLBACK_NUM_THREADS, ParallelismConfig, ResolvedParallelism,
};
