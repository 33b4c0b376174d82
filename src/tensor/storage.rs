//! Storage: an owned contiguous buffer with its shape and row-major strides

use super::broadcast::{BroadcastIndexer, materialize};
use super::shape::Shape;
use super::strides::Strides;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::borrow::Cow;

/// Dense, row-major, n-dimensional buffer
///
/// Invariants, upheld by every constructor and mutator:
/// - `data.len() == shape.elem_count()`
/// - `strides == Strides::contiguous(&shape)`, recomputed on every shape change
///
/// Dimensions of size 1 are broadcast-eligible: [`Storage::broadcast_offset`]
/// reads index 0 along them whatever the requested coordinate. Their stored
/// stride is left as computed; only the lookup ignores it.
///
/// `Clone` is a deep copy of the buffer.
#[derive(Clone, PartialEq)]
pub struct Storage<T: Element> {
    data: Vec<T>,
    shape: Shape,
    strides: Strides,
}

impl<T: Element> Storage<T> {
    /// Wrap an owned buffer, checking it holds exactly `product(shape)` elements
    pub fn new(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::shape_mismatch(shape, &[data.len()]));
        }
        Ok(Self::from_parts(data, Shape::from(shape)))
    }

    /// Copy a slice into a new storage of the given shape
    pub fn from_slice(data: &[T], shape: &[usize]) -> Result<Self> {
        Self::new(data.to_vec(), shape)
    }

    /// Storage filled with a single value
    pub fn full(value: T, shape: &[usize]) -> Self {
        let shape = Shape::from(shape);
        Self::from_parts(vec![value; shape.elem_count()], shape)
    }

    /// Storage filled with zeros
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(T::zero(), shape)
    }

    /// One-element storage of shape `[1]`, broadcastable against any shape
    pub fn scalar(value: T) -> Self {
        Self::from_parts(vec![value], Shape::from([1]))
    }

    pub(crate) fn from_parts(data: Vec<T>, shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.elem_count());
        let strides = Strides::contiguous(&shape);
        Self {
            data,
            shape,
            strides,
        }
    }

    /// Element type tag
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Dimension sizes
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major strides, in elements
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the storage holds no elements (some dimension is 0)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat, row-major view of the elements
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat view of the elements
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the storage and return its buffer
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Flat index of `coords`, treating size-1 dimensions as stretched
    ///
    /// `coords` may have a higher rank than this storage; it is aligned from
    /// the trailing dimension and leading extra coordinates are ignored.
    /// Returns `None` if a coordinate is out of range for a dimension that is
    /// not broadcast-eligible, or if `coords` has a lower rank.
    pub fn broadcast_offset(&self, coords: &[usize]) -> Option<usize> {
        let shift = coords.len().checked_sub(self.ndim())?;
        let mut offset = 0;
        for (d, (&dim, &stride)) in self.shape.iter().zip(self.strides.iter()).enumerate() {
            let c = coords[d + shift];
            if dim == 1 {
                continue;
            }
            if c >= dim {
                return None;
            }
            offset += c * stride;
        }
        Some(offset)
    }

    /// Element at `coords` with broadcast semantics, see [`Storage::broadcast_offset`]
    pub fn get(&self, coords: &[usize]) -> Option<T> {
        self.broadcast_offset(coords).map(|i| self.data[i])
    }

    /// Change the shape without touching the data
    ///
    /// Fails with `ShapeMismatch` when the element count differs; the storage is
    /// left unchanged in that case.
    pub fn reshape(&mut self, new_shape: &[usize]) -> Result<()> {
        let new_count: usize = new_shape.iter().product();
        if new_count != self.data.len() {
            return Err(Error::shape_mismatch(&self.shape, new_shape));
        }
        self.shape = Shape::from(new_shape);
        self.strides = Strides::contiguous(&self.shape);
        Ok(())
    }

    /// Replace this storage with its broadcast expansion to `target`
    ///
    /// No-op when the shape already equals `target`. On error nothing changes.
    pub fn broadcast_to_in_place(&mut self, target: &[usize]) -> Result<()> {
        if let Cow::Owned(expanded) = materialize(self, target)? {
            *self = expanded;
        }
        Ok(())
    }

    /// Indexer mapping flat positions of `target` back into this storage
    pub fn indexer_for(&self, target: &[usize]) -> Result<BroadcastIndexer> {
        BroadcastIndexer::new(&self.shape, target)
    }
}

impl<T: Element> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("dtype", &T::DTYPE)
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_element_count() {
        assert!(Storage::new(vec![1.0f32; 6], &[2, 3]).is_ok());
        let err = Storage::new(vec![1.0f32; 5], &[2, 3]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_strides_follow_shape() {
        let s = Storage::<f64>::zeros(&[2, 3, 4]);
        assert_eq!(s.strides(), &[12, 4, 1]);
        assert_eq!(s.len(), 24);
    }

    #[test]
    fn test_reshape_recomputes_strides() {
        let mut s = Storage::from_slice(&[1, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        s.reshape(&[6]).unwrap();
        assert_eq!(s.shape(), &[6]);
        assert_eq!(s.strides(), &[1]);
        s.reshape(&[3, 2]).unwrap();
        assert_eq!(s.strides(), &[2, 1]);
        assert_eq!(s.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_reshape_mismatch_leaves_storage_intact() {
        let mut s = Storage::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        assert!(matches!(s.reshape(&[4]), Err(Error::ShapeMismatch { .. })));
        assert_eq!(s.shape(), &[2, 3]);
        assert_eq!(s.strides(), &[3, 1]);
    }

    #[test]
    fn test_broadcast_offset_ignores_size_one_dims() {
        // shape [1, 3]: stored strides are [3, 1] but row coordinate never matters
        let s = Storage::from_slice(&[10, 20, 30], &[1, 3]).unwrap();
        assert_eq!(s.strides(), &[3, 1]);
        assert_eq!(s.get(&[0, 2]), Some(30));
        assert_eq!(s.get(&[4, 2]), Some(30));
        assert_eq!(s.get(&[7, 4, 1]), Some(20));
        assert_eq!(s.get(&[0, 3]), None);
        assert_eq!(s.get(&[1]), None);
    }

    #[test]
    fn test_broadcast_to_in_place_noop_on_same_shape() {
        let mut s = Storage::from_slice(&[1.0f32, 2.0], &[2]).unwrap();
        let before = s.clone();
        s.broadcast_to_in_place(&[2]).unwrap();
        assert_eq!(s, before);
    }
}
