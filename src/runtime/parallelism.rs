//! Worker-count and chunking configuration

use crate::error::{Error, Result};
use std::sync::OnceLock;

/// Minimum number of elements in one elementwise chunk
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 1024;

/// Worker count used when hardware concurrency cannot be detected
pub const FALLBACK_NUM_THREADS: usize = 4;

/// Environment variable overriding the worker count
const NUM_THREADS_ENV: &str = "FTENSOR_NUM_THREADS";

/// Environment variable overriding the minimum chunk size
const MIN_CHUNK_ENV: &str = "FTENSOR_MIN_CHUNK";

static HARDWARE_THREADS: OnceLock<usize> = OnceLock::new();
static ENV_PARALLELISM: OnceLock<ResolvedParallelism> = OnceLock::new();

/// Requested parallelism; `None` fields fall back to detected defaults
///
/// # Example
/// ```
/// use ftensor::runtime::ParallelismConfig;
/// let resolved = ParallelismConfig::new(Some(2), None).resolve().unwrap();
/// assert_eq!(resolved.num_threads, 2);
/// assert_eq!(resolved.min_chunk_size, 1024);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParallelismConfig {
    /// Worker threads; defaults to hardware concurrency
    pub num_threads: Option<usize>,
    /// Chunk floor in elements; defaults to [`DEFAULT_MIN_CHUNK_SIZE`]
    pub min_chunk_size: Option<usize>,
}

/// Concrete parallelism settings, fixed for the lifetime of an engine
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedParallelism {
    /// Worker threads, at least 1
    pub num_threads: usize,
    /// Chunk floor in elements, at least 1
    pub min_chunk_size: usize,
}

impl ParallelismConfig {
    /// Create a config with explicit overrides
    pub fn new(num_threads: Option<usize>, min_chunk_size: Option<usize>) -> Self {
        Self {
            num_threads,
            min_chunk_size,
        }
    }

    /// Read overrides from `FTENSOR_NUM_THREADS` / `FTENSOR_MIN_CHUNK`
    ///
    /// Unset variables leave the field as `None`; unparsable values are errors.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            num_threads: read_env_usize(NUM_THREADS_ENV, "num_threads")?,
            min_chunk_size: read_env_usize(MIN_CHUNK_ENV, "min_chunk_size")?,
        })
    }

    /// Fill in defaults and validate
    pub fn resolve(&self) -> Result<ResolvedParallelism> {
        let num_threads = match self.num_threads {
            Some(0) => {
                return Err(Error::invalid_argument(
                    "num_threads",
                    "worker count must be at least 1",
                ));
            }
            Some(n) => n,
            None => hardware_threads(),
        };
        let min_chunk_size = match self.min_chunk_size {
            Some(0) => {
                return Err(Error::invalid_argument(
                    "min_chunk_size",
                    "chunk floor must be at least 1",
                ));
            }
            Some(n) => n,
            None => DEFAULT_MIN_CHUNK_SIZE,
        };
        Ok(ResolvedParallelism {
            num_threads,
            min_chunk_size,
        })
    }
}

impl ResolvedParallelism {
    /// Hardware concurrency and the default chunk floor
    pub fn detect() -> Self {
        Self {
            num_threads: hardware_threads(),
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
        }
    }

    /// Settings from `FTENSOR_*` variables, read once per process
    ///
    /// Invalid values are logged and replaced by [`detect`](Self::detect).
    pub fn from_env() -> Self {
        *ENV_PARALLELISM.get_or_init(|| {
            match ParallelismConfig::from_env().and_then(|c| c.resolve()) {
                Ok(resolved) => resolved,
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring invalid parallelism environment");
                    Self::detect()
                }
            }
        })
    }

    /// Chunk length for `len` elements: `max(len / num_threads, min_chunk_size)`
    #[inline]
    pub fn chunk_size(&self, len: usize) -> usize {
        (len / self.num_threads).max(self.min_chunk_size)
    }

    /// Workers needed to cover `len` elements: `ceil(len / chunk_size)`
    #[inline]
    pub fn worker_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size(len))
    }
}

impl Default for ResolvedParallelism {
    fn default() -> Self {
        Self::detect()
    }
}

/// Detected hardware concurrency, queried once per process
pub fn hardware_threads() -> usize {
    *HARDWARE_THREADS.get_or_init(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_NUM_THREADS)
    })
}

fn read_env_usize(var: &'static str, arg: &'static str) -> Result<Option<usize>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| Error::invalid_argument(arg, format!("{}={:?}: {}", var, raw, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let r = ParallelismConfig::default().resolve().unwrap();
        assert!(r.num_threads >= 1);
        assert_eq!(r.min_chunk_size, DEFAULT_MIN_CHUNK_SIZE);
        assert_eq!(r, ResolvedParallelism::detect());
    }

    #[test]
    fn test_zero_is_rejected() {
        assert!(ParallelismConfig::new(Some(0), None).resolve().is_err());
        assert!(ParallelismConfig::new(None, Some(0)).resolve().is_err());
    }

    #[test]
    fn test_chunking_math() {
        let r = ParallelismConfig::new(Some(4), None).resolve().unwrap();
        // Small arrays collapse onto the chunk floor
        assert_eq!(r.chunk_size(100), 1024);
        assert_eq!(r.worker_count(100), 1);
        assert_eq!(r.chunk_size(10_000), 2500);
        assert_eq!(r.worker_count(10_000), 4);
        // Rounding can add one short trailing chunk
        assert_eq!(r.chunk_size(10_003), 2500);
        assert_eq!(r.worker_count(10_003), 5);
        assert_eq!(r.worker_count(0), 0);
    }
}
