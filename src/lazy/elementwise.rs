//! Lazy elementwise engine

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::ops::ElementwiseOp;
use crate::runtime::cpu::kernels::{binary_in_place, unary_in_place};
use crate::runtime::cpu::workers::{SharedMut, for_each_chunk};
use crate::runtime::{ParallelismConfig, ResolvedParallelism};
use crate::tensor::{BroadcastIndexer, Shape, Storage, broadcast_all};
use std::ops::Range;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Elements processed per op before moving to the next op inside a chunk
///
/// Keeps the core tile and the gathered operand tile cache-resident while
/// every queued op runs over them.
const TILE: usize = 2048;

#[derive(Clone)]
struct BatchOp<T: Element> {
    op: ElementwiseOp<T>,
    operand: Arc<Storage<T>>,
}

/// Ordered queue of elementwise operations applied to a core storage
///
/// Nothing is computed on [`enqueue`](Self::enqueue). [`execute`](Self::execute)
/// broadcasts the core against every queued operand, then runs all ops in a
/// single pass: for each element, op `k` reads the value written by op `k - 1`.
///
/// # Example
///
/// ```
/// use ftensor::lazy::ElementwiseBatch;
/// use ftensor::ops::BinaryOp;
/// use ftensor::tensor::Storage;
/// use std::sync::Arc;
///
/// let mut core = Storage::from_slice(&[1.0f32, 2.0, 3.0], &[3]).unwrap();
/// let one = Arc::new(Storage::scalar(1.0f32));
/// let two = Arc::new(Storage::scalar(2.0f32));
///
/// let mut batch = ElementwiseBatch::new();
/// batch.enqueue(one, BinaryOp::Add);
/// batch.enqueue(two, BinaryOp::Mul);
/// batch.execute(&mut core).unwrap();
///
/// assert_eq!(core.data(), &[4.0, 6.0, 8.0]);
/// assert!(batch.is_empty());
/// ```
#[derive(Clone)]
pub struct ElementwiseBatch<T: Element> {
    ops: Vec<BatchOp<T>>,
    parallelism: ResolvedParallelism,
}

impl<T: Element> ElementwiseBatch<T> {
    /// Empty batch using the process defaults
    ///
    /// Thread count and chunk floor come from `FTENSOR_NUM_THREADS` and
    /// `FTENSOR_MIN_CHUNK` when set, else hardware concurrency and 1024.
    pub fn new() -> Self {
        Self::with_resolved(ResolvedParallelism::from_env())
    }

    /// Empty batch with explicit parallelism settings
    pub fn with_parallelism(config: &ParallelismConfig) -> Result<Self> {
        Ok(Self::with_resolved(config.resolve()?))
    }

    /// Empty batch with already resolved settings
    pub fn with_resolved(parallelism: ResolvedParallelism) -> Self {
        Self {
            ops: Vec::new(),
            parallelism,
        }
    }

    /// Parallelism settings used by `execute`
    pub fn parallelism(&self) -> ResolvedParallelism {
        self.parallelism
    }

    /// Replace the parallelism settings, keeping queued ops
    pub fn set_parallelism(&mut self, parallelism: ResolvedParallelism) {
        self.parallelism = parallelism;
    }

    /// Queue `op` with `operand`; no validation happens here
    pub fn enqueue(&mut self, operand: Arc<Storage<T>>, op: impl Into<ElementwiseOp<T>>) {
        self.ops.push(BatchOp {
            op: op.into(),
            operand,
        });
    }

    /// Number of queued ops
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Drop every queued op without running it
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Shape the core would have after `execute`
    pub fn target_shape(&self, core_shape: &[usize]) -> Result<Shape> {
        broadcast_all(core_shape, self.ops.iter().map(|b| b.operand.shape()))
    }

    /// Run every queued op against `core`, then clear the queue
    ///
    /// If the broadcast target differs from the core's shape, the core is
    /// replaced by its materialized expansion before computing; this is
    /// visible to the caller even though only the queued ops were requested.
    ///
    /// Fails with `BroadcastError` before touching `core` or the queue when
    /// any operand is incompatible. Built-in ops are total and cannot fail
    /// once computing starts. If a custom op panics, `core` is restored to
    /// its state before the call, the queue is kept and `Internal` is
    /// returned.
    pub fn execute(&mut self, core: &mut Storage<T>) -> Result<()> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let target = self.target_shape(core.shape())?;
        let indexers = self
            .ops
            .iter()
            .map(|b| b.operand.indexer_for(&target))
            .collect::<Result<Vec<_>>>()?;

        // Only user closures can panic mid-buffer
        let snapshot = self
            .ops
            .iter()
            .any(|b| matches!(b.op, ElementwiseOp::Custom(_)))
            .then(|| core.clone());

        if core.shape() != target.as_slice() {
            tracing::debug!(from = ?core.shape(), to = ?target, "materializing core");
            core.broadcast_to_in_place(&target)?;
        }

        let len = core.len();
        tracing::debug!(
            ops = self.ops.len(),
            shape = ?target,
            len,
            chunk = self.parallelism.chunk_size(len),
            workers = self.parallelism.worker_count(len),
            "executing elementwise batch"
        );

        let ops = &self.ops;
        let indexers = &indexers;
        let parallelism = &self.parallelism;
        let shared = SharedMut::new(core.data_mut());
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            for_each_chunk(len, parallelism, |range| {
                // SAFETY: for_each_chunk hands out disjoint ranges within [0, len)
                // and the core buffer outlives the call.
                let out = unsafe { shared.slice_mut(range.clone()) };
                run_chunk(ops, indexers, range, out);
            })
        }));

        match (outcome, snapshot) {
            (Ok(()), _) => {
                self.ops.clear();
                Ok(())
            }
            (Err(_), Some(before)) => {
                tracing::warn!(ops = self.ops.len(), "custom op panicked; core restored");
                *core = before;
                Err(Error::Internal("custom elementwise op panicked".to_string()))
            }
            (Err(payload), None) => std::panic::resume_unwind(payload),
        }
    }
}

impl<T: Element> Default for ElementwiseBatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> std::fmt::Debug for ElementwiseBatch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementwiseBatch")
            .field("ops", &self.ops.iter().map(|b| &b.op).collect::<Vec<_>>())
            .field("parallelism", &self.parallelism)
            .finish()
    }
}

/// Apply every op, in queue order, to the core elements of `range`
fn run_chunk<T: Element>(
    ops: &[BatchOp<T>],
    indexers: &[BroadcastIndexer],
    range: Range<usize>,
    out: &mut [T],
) {
    let mut scratch = vec![T::zero(); TILE.min(range.len())];
    let mut tile_start = 0;
    while tile_start < out.len() {
        let tile_end = (tile_start + TILE).min(out.len());
        let tile = &mut out[tile_start..tile_end];
        let flat = range.start + tile_start;

        for (batch_op, indexer) in ops.iter().zip(indexers) {
            if let ElementwiseOp::Unary(op) = batch_op.op {
                unary_in_place(op, tile);
                continue;
            }

            let operand: &[T] = if indexer.is_identity() {
                &batch_op.operand.data()[flat..flat + tile.len()]
            } else {
                let buf = &mut scratch[..tile.len()];
                indexer.gather(batch_op.operand.data(), flat, buf);
                buf
            };

            match &batch_op.op {
                ElementwiseOp::Binary(op) => binary_in_place(*op, tile, operand),
                ElementwiseOp::Custom(f) => {
                    for (o, &r) in tile.iter_mut().zip(operand) {
                        *o = f(*o, r);
                    }
                }
                ElementwiseOp::Unary(_) => unreachable!(),
            }
        }

        tile_start = tile_end;
    }
}
