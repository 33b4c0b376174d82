//! Ephemeral chunked workers with dynamic load balancing
//!
//! `[0, len)` is cut into chunks of `max(len / num_threads, min_chunk_size)`
//! elements. `ceil(len / chunk)` workers (the calling thread being one of
//! them) repeatedly claim the next chunk with a fetch-add on a shared cursor
//! until it passes `len`. No chunk is assigned statically to a thread.

use crate::runtime::ResolvedParallelism;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Run `f` over every chunk of `[0, len)`, blocking until all chunks are done
///
/// Chunks are disjoint and cover the range exactly once; their processing
/// order across threads is unspecified. A panic in `f` is re-raised on the
/// calling thread after every worker has been joined.
pub fn for_each_chunk<F>(len: usize, parallelism: &ResolvedParallelism, f: F)
where
    F: Fn(Range<usize>) + Sync,
{
    if len == 0 {
        return;
    }
    let chunk = parallelism.chunk_size(len);
    let workers = parallelism.worker_count(len);
    let cursor = AtomicUsize::new(0);

    let drain = || {
        loop {
            let start = cursor.fetch_add(chunk, Ordering::Relaxed);
            if start >= len {
                break;
            }
            f(start..(start + chunk).min(len));
        }
    };

    tracing::trace!(len, chunk, workers, "dispatching chunks");

    if workers <= 1 {
        drain();
        return;
    }

    std::thread::scope(|s| {
        for _ in 1..workers {
            s.spawn(drain);
        }
        drain();
    });
}

/// Raw pointer to a buffer whose disjoint sub-ranges are written by different workers
pub(crate) struct SharedMut<T> {
    ptr: *mut T,
    len: usize,
}

// SAFETY: access goes through `slice_mut`, whose contract requires disjoint
// ranges per thread; T itself must be Send to be written from other threads.
unsafe impl<T: Send> Send for SharedMut<T> {}
unsafe impl<T: Send> Sync for SharedMut<T> {}

impl<T> SharedMut<T> {
    pub(crate) fn new(buf: &mut [T]) -> Self {
        Self {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
        }
    }

    /// Mutable view of `range`
    ///
    /// # Safety
    /// - The buffer passed to `new` must outlive every returned slice
    /// - Ranges handed out concurrently must not overlap
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn slice_mut(&self, range: Range<usize>) -> &mut [T] {
        assert!(range.start <= range.end && range.end <= self.len);
        unsafe { std::slice::from_raw_parts_mut(self.ptr.add(range.start), range.len()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ParallelismConfig;
    use std::sync::atomic::AtomicU8;

    fn covered(len: usize, threads: usize, min_chunk: usize) -> Vec<u8> {
        let p = ParallelismConfig::new(Some(threads), Some(min_chunk))
            .resolve()
            .unwrap();
        let hits: Vec<AtomicU8> = (0..len).map(|_| AtomicU8::new(0)).collect();
        for_each_chunk(len, &p, |r| {
            for i in r {
                hits[i].fetch_add(1, Ordering::Relaxed);
            }
        });
        hits.into_iter().map(|h| h.into_inner()).collect()
    }

    #[test]
    fn test_every_index_visited_once() {
        for &(len, threads, min_chunk) in &[
            (0, 4, 1024),
            (1, 4, 1024),
            (1000, 4, 1024),
            (10_003, 4, 1024),
            (5000, 64, 7),
            (4096, 3, 1),
        ] {
            let hits = covered(len, threads, min_chunk);
            assert!(
                hits.iter().all(|&h| h == 1),
                "len={} threads={} min_chunk={}",
                len,
                threads,
                min_chunk
            );
        }
    }

    #[test]
    fn test_shared_mut_disjoint_writes() {
        let mut buf = vec![0usize; 9000];
        let shared = SharedMut::new(&mut buf);
        let p = ParallelismConfig::new(Some(8), Some(100)).resolve().unwrap();
        for_each_chunk(9000, &p, |r| {
            let start = r.start;
            let slice = unsafe { shared.slice_mut(r) };
            for (k, v) in slice.iter_mut().enumerate() {
                *v = start + k;
            }
        });
        assert!(buf.iter().enumerate().all(|(i, &v)| i == v));
    }
}
