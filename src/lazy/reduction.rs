//! Lazy reduction engine

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::ops::Reduction;
use crate::runtime::cpu::{ThreadPool, global_pool, kernels};
use crate::tensor::Storage;
use std::sync::Arc;
use std::sync::mpsc;

/// User-supplied whole-array reduction
pub type CustomReduction<T> = Arc<dyn Fn(&Storage<T>) -> T + Send + Sync>;

#[derive(Clone)]
enum ReductionTask<T: Element> {
    Builtin(Reduction),
    Custom(CustomReduction<T>),
}

impl<T: Element> ReductionTask<T> {
    fn run(&self, storage: &Storage<T>) -> Result<T> {
        match self {
            Self::Builtin(r) => kernels::reduce(*r, storage.data()),
            Self::Custom(f) => Ok(f(storage)),
        }
    }
}

/// Ordered queue of reductions evaluated concurrently on a thread pool
///
/// Each queued reduction becomes one pool job that scans the whole storage;
/// reductions are never split across jobs. Results come back in enqueue
/// order regardless of which job finishes first.
pub struct ReductionBatch<T: Element> {
    pool: Arc<ThreadPool>,
    tasks: Vec<ReductionTask<T>>,
}

impl<T: Element> ReductionBatch<T> {
    /// Empty batch submitting to `pool`
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        Self {
            pool,
            tasks: Vec::new(),
        }
    }

    /// Empty batch on the process-wide pool
    pub fn with_global_pool() -> Result<Self> {
        Ok(Self::new(global_pool()?))
    }

    /// Queue a custom reduction
    pub fn enqueue<F>(&mut self, f: F)
    where
        F: Fn(&Storage<T>) -> T + Send + Sync + 'static,
    {
        self.tasks.push(ReductionTask::Custom(Arc::new(f)));
    }

    /// Queue a built-in reduction
    pub fn enqueue_builtin(&mut self, r: Reduction) {
        self.tasks.push(ReductionTask::Builtin(r));
    }

    /// Number of queued reductions
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pool the batch submits to
    pub fn pool(&self) -> &Arc<ThreadPool> {
        &self.pool
    }

    /// Run every queued reduction against `storage`, blocking until all finish
    ///
    /// Returns one value per queued reduction, in enqueue order, and clears
    /// the queue. Extremal reductions of an empty storage fail with
    /// `InvalidArgument` before anything is submitted. A reduction that
    /// panics yields `Internal`. The queue is left intact on any error.
    pub fn execute(&mut self, storage: &Arc<Storage<T>>) -> Result<Vec<T>> {
        if self.tasks.is_empty() {
            return Ok(Vec::new());
        }
        if storage.is_empty() {
            let extremal = self.tasks.iter().find_map(|t| match t {
                ReductionTask::Builtin(r) if r.requires_elements() => Some(*r),
                _ => None,
            });
            if let Some(r) = extremal {
                return Err(Error::invalid_argument(
                    "storage",
                    format!("{} of an empty array", r.name()),
                ));
            }
        }

        let n = self.tasks.len();
        tracing::debug!(tasks = n, len = storage.len(), "submitting reductions");

        let (tx, rx) = mpsc::channel();
        for (idx, task) in self.tasks.iter().enumerate() {
            let task = task.clone();
            let storage = Arc::clone(storage);
            let tx = tx.clone();
            self.pool.execute(move || {
                // The receiver only disappears if execute already returned
                let _ = tx.send((idx, task.run(&storage)));
            });
        }
        drop(tx);

        // Ends once every job has either sent or dropped its sender
        let mut slots: Vec<Option<T>> = vec![None; n];
        for (idx, result) in rx {
            slots[idx] = Some(result?);
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(idx, v)| {
                v.ok_or_else(|| Error::Internal(format!("reduction task {} panicked", idx)))
            })
            .collect::<Result<Vec<_>>>()?;

        self.tasks.clear();
        Ok(results)
    }
}

impl<T: Element> std::fmt::Debug for ReductionBatch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReductionBatch")
            .field("tasks", &self.tasks.len())
            .field("pool", &self.pool)
            .finish()
    }
}
