//! Strides type: row-major element offsets

use super::shape::STACK_DIMS;
use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;

/// Element offset between consecutive indices along each dimension
///
/// Always derived from a shape, never set independently: storages are
/// contiguous and row-major, so `strides[i] == product(shape[i + 1..])`.
/// Strides are in ELEMENTS, not bytes.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Strides(SmallVec<[usize; STACK_DIMS]>);

impl Strides {
    /// Compute contiguous (row-major) strides for a shape
    ///
    /// ```
    /// use ftensor::tensor::Strides;
    /// assert_eq!(Strides::contiguous(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        let mut strides: SmallVec<[usize; STACK_DIMS]> = SmallVec::from_elem(0, shape.len());
        let mut stride = 1usize;
        for (slot, &dim) in strides.iter_mut().zip(shape.iter()).rev() {
            *slot = stride;
            stride *= dim;
        }
        Self(strides)
    }

    /// View strides as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl Deref for Strides {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for Strides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
