//! Shape broadcasting and broadcast materialization
//!
//! Broadcasting follows the NumPy rules: shapes are right-aligned, the shorter
//! one is padded with leading 1s, and each aligned pair of dimensions must be
//! equal or contain a 1.

use super::shape::{STACK_DIMS, Shape};
use super::storage::Storage;
use crate::dtype::Element;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::borrow::Cow;

/// Elements per rayon task when filling a materialized buffer
#[cfg(feature = "rayon")]
const MATERIALIZE_CHUNK: usize = 16 * 1024;

/// Compute the broadcast shape of two shapes
///
/// ```
/// use ftensor::tensor::broadcast_shapes;
/// assert_eq!(broadcast_shapes(&[5, 1], &[1, 3]).unwrap(), [5, 3]);
/// assert_eq!(broadcast_shapes(&[4], &[3, 4]).unwrap(), [3, 4]);
/// assert!(broadcast_shapes(&[2, 3], &[4]).is_err());
/// ```
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<Shape> {
    let max_ndim = a.len().max(b.len());
    let mut result = Shape::with_capacity(max_ndim);

    // Iterate from right to left
    for i in 0..max_ndim {
        let a_dim = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let b_dim = if i < b.len() { b[b.len() - 1 - i] } else { 1 };

        if a_dim == b_dim || b_dim == 1 {
            result.push(a_dim);
        } else if a_dim == 1 {
            result.push(b_dim);
        } else {
            return Err(Error::broadcast(a, b, i));
        }
    }

    result.reverse();
    Ok(result)
}

/// Fold `base` with every shape in `others`, pairwise and left to right
///
/// The first incompatible shape aborts the fold.
pub fn broadcast_all<'a, I>(base: &[usize], others: I) -> Result<Shape>
where
    I: IntoIterator<Item = &'a [usize]>,
{
    others
        .into_iter()
        .try_fold(Shape::from(base), |acc, shape| broadcast_shapes(&acc, shape))
}

/// Maps flat indices of a broadcast target shape back into a source buffer
///
/// Built once per (source shape, target shape) pair. Every target dimension
/// gets an effective source stride: the source's row-major stride where the
/// sizes match, and 0 where the source dimension is 1 or absent.
#[derive(Clone, Debug)]
pub struct BroadcastIndexer {
    target: Shape,
    strides: SmallVec<[usize; STACK_DIMS]>,
    identity: bool,
    uniform: bool,
}

impl BroadcastIndexer {
    /// Build an indexer; fails if `source` does not broadcast to exactly `target`
    pub fn new(source: &[usize], target: &[usize]) -> Result<Self> {
        if source.len() > target.len() {
            return Err(Error::broadcast(source, target, target.len()));
        }
        let shift = target.len() - source.len();
        let mut strides: SmallVec<[usize; STACK_DIMS]> = SmallVec::from_elem(0, target.len());

        let mut source_stride = 1usize;
        for i in (shift..target.len()).rev() {
            let s = source[i - shift];
            let t = target[i];
            if s == t {
                strides[i] = if s == 1 { 0 } else { source_stride };
            } else if s != 1 {
                return Err(Error::broadcast(source, target, target.len() - 1 - i));
            }
            source_stride *= s;
        }

        Ok(Self {
            target: Shape::from(target),
            identity: source == target,
            uniform: strides.iter().all(|&s| s == 0),
            strides,
        })
    }

    /// The target shape this indexer walks
    pub fn target(&self) -> &[usize] {
        &self.target
    }

    /// True when source and target shapes are identical (no remapping)
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// True when every target position reads the same source element
    #[inline]
    pub fn is_uniform(&self) -> bool {
        self.uniform
    }

    /// Source flat index for target flat index `flat`
    pub fn source_index(&self, flat: usize) -> usize {
        if self.identity {
            return flat;
        }
        let mut rem = flat;
        let mut offset = 0;
        for (&dim, &stride) in self.target.iter().zip(self.strides.iter()).rev() {
            offset += (rem % dim) * stride;
            rem /= dim;
        }
        offset
    }

    /// Fill `out` with source values for target positions `start..start + out.len()`
    pub fn gather<T: Copy>(&self, src: &[T], start: usize, out: &mut [T]) {
        if out.is_empty() {
            return;
        }
        if self.identity {
            out.copy_from_slice(&src[start..start + out.len()]);
            return;
        }
        if self.uniform {
            out.fill(src[0]);
            return;
        }

        let ndim = self.target.ndim();
        let mut coords: SmallVec<[usize; STACK_DIMS]> = SmallVec::from_elem(0, ndim);
        let mut rem = start;
        for d in (0..ndim).rev() {
            coords[d] = rem % self.target[d];
            rem /= self.target[d];
        }
        let mut offset = self.source_index(start);

        // Incremental odometer over the target coordinates
        for slot in out.iter_mut() {
            *slot = src[offset];
            for d in (0..ndim).rev() {
                coords[d] += 1;
                offset += self.strides[d];
                if coords[d] < self.target[d] {
                    break;
                }
                offset -= self.target[d] * self.strides[d];
                coords[d] = 0;
            }
        }
    }
}

/// Expand `storage` to `target`, returning it untouched when the shapes match
///
/// Every flat index of the target is mapped back to the source coordinate
/// (size-1 source dimensions read index 0, missing leading dimensions are
/// ignored) and the value copied into a fresh buffer. The result is a new
/// storage with its own contiguous strides.
pub fn materialize<'a, T: Element>(
    storage: &'a Storage<T>,
    target: &[usize],
) -> Result<Cow<'a, Storage<T>>> {
    if storage.shape() == target {
        return Ok(Cow::Borrowed(storage));
    }

    let indexer = BroadcastIndexer::new(storage.shape(), target)?;
    let target_shape = Shape::from(target);
    let mut data = vec![T::zero(); target_shape.elem_count()];
    fill_from_indexer(&indexer, storage.data(), &mut data);

    tracing::trace!(
        from = ?storage.shape(),
        to = ?target,
        elems = data.len(),
        "materialized broadcast"
    );
    Ok(Cow::Owned(Storage::from_parts(data, target_shape)))
}

#[cfg(feature = "rayon")]
fn fill_from_indexer<T: Element>(indexer: &BroadcastIndexer, src: &[T], out: &mut [T]) {
    use rayon::prelude::*;

    if out.len() <= MATERIALIZE_CHUNK {
        indexer.gather(src, 0, out);
        return;
    }
    out.par_chunks_mut(MATERIALIZE_CHUNK)
        .enumerate()
        .for_each(|(i, chunk)| indexer.gather(src, i * MATERIALIZE_CHUNK, chunk));
}

#[cfg(not(feature = "rayon"))]
fn fill_from_indexer<T: Element>(indexer: &BroadcastIndexer, src: &[T], out: &mut [T]) {
    indexer.gather(src, 0, out);
}
