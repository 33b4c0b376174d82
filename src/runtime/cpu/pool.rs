//! Long-lived worker pool for independent tasks

use crate::error::{Error, Result};
use crate::runtime::ParallelismConfig;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Queue {
    jobs: VecDeque<Job>,
    stopping: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
}

/// Fixed set of persistent worker threads
///
/// Each worker waits on a condition variable until the queue is non-empty or
/// the pool is stopping, pops one job and runs it outside the lock. Dropping
/// the pool sets the stop flag, wakes every worker and joins them; jobs
/// already queued are drained before the workers exit.
///
/// A job that panics is caught and logged; its worker keeps serving.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `num_threads` workers
    pub fn new(num_threads: usize) -> Result<Self> {
        if num_threads == 0 {
            return Err(Error::invalid_argument(
                "num_threads",
                "thread pool needs at least one worker",
            ));
        }

        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                jobs: VecDeque::new(),
                stopping: false,
            }),
            available: Condvar::new(),
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(num_threads),
        };
        for i in 0..num_threads {
            let shared = Arc::clone(&pool.shared);
            let handle = std::thread::Builder::new()
                .name(format!("ftensor-pool-{}", i))
                .spawn(move || worker_loop(&shared))
                .map_err(|e| Error::Internal(format!("failed to spawn pool worker: {}", e)))?;
            pool.workers.push(handle);
        }

        tracing::debug!(num_threads, "thread pool started");
        Ok(pool)
    }

    /// Spawn a pool sized from a [`ParallelismConfig`]
    pub fn with_config(config: &ParallelismConfig) -> Result<Self> {
        Self::new(config.resolve()?.num_threads)
    }

    /// Number of worker threads
    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    /// Queue a job; one idle worker is woken
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.queue.lock().jobs.push_back(Box::new(job));
        self.shared.available.notify_one();
    }

    /// Jobs waiting for a worker
    pub fn queued(&self) -> usize {
        self.shared.queue.lock().jobs.len()
    }

    /// Stop the pool after draining queued jobs; same as dropping it
    pub fn shutdown(self) {}
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.queue.lock().stopping = true;
        self.shared.available.notify_all();
        for handle in self.workers.drain(..) {
            // Jobs run under catch_unwind, so a worker only errs on a bug here
            if handle.join().is_err() {
                tracing::error!("thread pool worker exited abnormally");
            }
        }
        tracing::debug!("thread pool stopped");
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.workers.len())
            .finish()
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(job) = queue.jobs.pop_front() {
                    break job;
                }
                if queue.stopping {
                    return;
                }
                shared.available.wait(&mut queue);
            }
        };

        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::warn!("thread pool job panicked");
        }
    }
}

static GLOBAL_POOL: OnceLock<Arc<ThreadPool>> = OnceLock::new();

/// Process-wide pool shared by the facade's reduction calls
///
/// Created on first use with [`ParallelismConfig::from_env`].
pub fn global_pool() -> Result<Arc<ThreadPool>> {
    if let Some(pool) = GLOBAL_POOL.get() {
        return Ok(Arc::clone(pool));
    }
    let pool = Arc::new(ThreadPool::with_config(&ParallelismConfig::from_env()?)?);
    // A racing initializer may have won; its pool is kept and ours is dropped
    Ok(Arc::clone(GLOBAL_POOL.get_or_init(|| pool)))
}
