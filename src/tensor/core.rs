//! Lazy Tensor facade

use super::shape::Shape;
use super::storage::Storage;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::lazy::{ElementwiseBatch, ReductionBatch};
use crate::ops::{BinaryOp, ElementwiseOp, Reduction, UnaryOp};
use crate::runtime::ParallelismConfig;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;

/// N-dimensional array with deferred elementwise evaluation
///
/// A `Tensor` is an `Arc`-shared [`Storage`] snapshot plus a queue of pending
/// elementwise ops. Arithmetic methods and operators only extend the queue;
/// [`evaluate`](Self::evaluate) runs the whole queue in one fused,
/// multithreaded pass. Cloning is cheap until one of the clones is evaluated,
/// at which point that clone gets its own copy of the buffer.
///
/// Operands are captured in their evaluated state: ops still pending on the
/// right-hand tensor are not part of the snapshot.
///
/// # Example
///
/// ```
/// use ftensor::prelude::*;
///
/// let x = Tensor::from_slice(&[1.0f64, 2.0, 3.0], &[3]).unwrap();
/// let y = Tensor::from_slice(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0], &[2, 3]).unwrap();
///
/// let z = (&x + &y).evaluate().unwrap();
/// assert_eq!(z.shape(), &[2, 3]);
/// assert_eq!(z.to_vec().unwrap(), vec![11.0, 22.0, 33.0, 41.0, 52.0, 63.0]);
/// assert_eq!(z.sum().unwrap(), 222.0);
/// ```
#[derive(Clone)]
pub struct Tensor<T: Element> {
    storage: Arc<Storage<T>>,
    pending: ElementwiseBatch<T>,
}

impl<T: Element> Tensor<T> {
    // ===== Construction =====

    /// Wrap an existing storage
    pub fn from_storage(storage: Storage<T>) -> Self {
        Self {
            storage: Arc::new(storage),
            pending: ElementwiseBatch::new(),
        }
    }

    /// Create a tensor from a slice of data
    ///
    /// Fails with `ShapeMismatch` if `data.len()` is not the product of `shape`.
    pub fn from_slice(data: &[T], shape: &[usize]) -> Result<Self> {
        Storage::from_slice(data, shape).map(Self::from_storage)
    }

    /// Tensor filled with `value`
    pub fn full(value: T, shape: &[usize]) -> Self {
        Self::from_storage(Storage::full(value, shape))
    }

    /// Tensor filled with zeros
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(T::zero(), shape)
    }

    /// Tensor filled with ones
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(T::one(), shape)
    }

    /// One-dimensional tensor `[0, 1, ..., len - 1]`
    pub fn arange(len: usize) -> Self {
        let data = (0..len).map(|i| T::from_f64(i as f64)).collect();
        Self::from_storage(Storage::from_parts(data, [len].into()))
    }

    /// Uniform random values in `[low, high)` from the thread-local RNG
    ///
    /// Only floating-point dtypes are supported.
    pub fn random(low: T, high: T, shape: &[usize]) -> Result<Self> {
        Self::random_with(&mut rand::rng(), low, high, shape)
    }

    /// Like [`random`](Self::random) with a reproducible seed
    pub fn random_seeded(low: T, high: T, shape: &[usize], seed: u64) -> Result<Self> {
        Self::random_with(&mut rand::rngs::StdRng::seed_from_u64(seed), low, high, shape)
    }

    fn random_with<R: Rng>(rng: &mut R, low: T, high: T, shape: &[usize]) -> Result<Self> {
        if !T::DTYPE.is_float() {
            return Err(Error::unsupported_dtype(T::DTYPE, "random"));
        }
        let (lo, hi) = (low.to_f64(), high.to_f64());
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(Error::invalid_argument(
                "range",
                format!("need finite low < high, got [{}, {})", lo, hi),
            ));
        }

        let len: usize = shape.iter().product();
        let data = (0..len)
            .map(|_| {
                let u: f64 = rng.random();
                T::from_f64(lo + (hi - lo) * u)
            })
            .collect();
        Ok(Self::from_storage(Storage::from_parts(data, shape.into())))
    }

    /// Use explicit parallelism settings for elementwise evaluation
    pub fn with_parallelism(mut self, config: &ParallelismConfig) -> Result<Self> {
        self.pending.set_parallelism(config.resolve()?);
        Ok(self)
    }

    // ===== Accessors =====

    /// Shape of the stored data; pending ops may still grow it by broadcasting
    pub fn shape(&self) -> &[usize] {
        self.storage.shape()
    }

    /// Number of dimensions of the stored data
    pub fn ndim(&self) -> usize {
        self.storage.ndim()
    }

    /// Number of stored elements
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Element type tag
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Stored data, ignoring pending ops
    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    /// Number of queued, not yet evaluated ops
    pub fn pending_ops(&self) -> usize {
        self.pending.len()
    }

    /// True when no ops are pending
    pub fn is_evaluated(&self) -> bool {
        self.pending.is_empty()
    }

    // ===== Lazy elementwise ops =====

    fn push(&self, operand: Arc<Storage<T>>, op: ElementwiseOp<T>) -> Self {
        let mut out = self.clone();
        out.pending.enqueue(operand, op);
        out
    }

    fn binary(&self, other: &Tensor<T>, op: BinaryOp) -> Self {
        if !other.is_evaluated() {
            tracing::warn!(
                pending = other.pending_ops(),
                "operand has pending ops that are not part of its snapshot"
            );
        }
        self.push(Arc::clone(&other.storage), op.into())
    }

    fn unary(&self, op: UnaryOp) -> Self {
        // Rank-0 operand broadcasts against any shape without changing it
        self.push(Arc::new(Storage::from_parts(vec![T::zero()], Shape::new())), op.into())
    }

    /// Queue `self + other`
    pub fn add(&self, other: &Tensor<T>) -> Self {
        self.binary(other, BinaryOp::Add)
    }

    /// Queue `self - other`
    pub fn sub(&self, other: &Tensor<T>) -> Self {
        self.binary(other, BinaryOp::Sub)
    }

    /// Queue `self * other`
    pub fn mul(&self, other: &Tensor<T>) -> Self {
        self.binary(other, BinaryOp::Mul)
    }

    /// Queue `self / other`
    pub fn div(&self, other: &Tensor<T>) -> Self {
        self.binary(other, BinaryOp::Div)
    }

    /// Queue `self ^ other`
    pub fn pow(&self, other: &Tensor<T>) -> Self {
        self.binary(other, BinaryOp::Pow)
    }

    /// Queue an elementwise op against a scalar
    pub fn scalar_op(&self, op: BinaryOp, value: T) -> Self {
        self.push(Arc::new(Storage::scalar(value)), op.into())
    }

    /// Queue `sqrt(self)`
    pub fn sqrt(&self) -> Self {
        self.unary(UnaryOp::Sqrt)
    }

    /// Queue `sin(self)`
    pub fn sin(&self) -> Self {
        self.unary(UnaryOp::Sin)
    }

    /// Queue `cos(self)`
    pub fn cos(&self) -> Self {
        self.unary(UnaryOp::Cos)
    }

    /// Queue `f(self, other)` evaluated element by element
    pub fn map_with<F>(&self, other: &Tensor<T>, f: F) -> Self
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        self.push(Arc::clone(&other.storage), ElementwiseOp::custom(f))
    }

    // ===== Evaluation =====

    /// Run every pending op and return the evaluated tensor
    pub fn evaluate(mut self) -> Result<Self> {
        self.eval_in_place()?;
        Ok(self)
    }

    /// Run every pending op in place
    ///
    /// On error the tensor keeps its data and its pending ops.
    pub fn eval_in_place(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        // Fail before copying a shared buffer
        self.pending.target_shape(self.storage.shape())?;
        let core = Arc::make_mut(&mut self.storage);
        self.pending.execute(core)
    }

    /// Storage with pending ops applied, without touching `self`
    fn evaluated_storage(&self) -> Result<Arc<Storage<T>>> {
        if self.pending.is_empty() {
            return Ok(Arc::clone(&self.storage));
        }
        let mut copy = self.clone();
        copy.eval_in_place()?;
        Ok(copy.storage)
    }

    // ===== Shape =====

    /// Tensor with the same (evaluated) data viewed under a new shape
    ///
    /// Fails with `ShapeMismatch` when the element counts differ.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let mut storage = Arc::unwrap_or_clone(self.evaluated_storage()?);
        storage.reshape(shape)?;
        Ok(Self {
            storage: Arc::new(storage),
            pending: ElementwiseBatch::with_resolved(self.pending.parallelism()),
        })
    }

    /// Evaluated data as a flat row-major vector
    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.evaluated_storage()?.data().to_vec())
    }

    // ===== Reductions =====

    /// Run several reductions concurrently on the global pool
    ///
    /// Results are returned in the order of `reductions`.
    pub fn stats(&self, reductions: &[Reduction]) -> Result<Vec<T>> {
        let storage = self.evaluated_storage()?;
        let mut batch = ReductionBatch::with_global_pool()?;
        for &r in reductions {
            batch.enqueue_builtin(r);
        }
        batch.execute(&storage)
    }

    fn reduce_one(&self, r: Reduction) -> Result<T> {
        self.stats(&[r])?
            .pop()
            .ok_or_else(|| Error::Internal(format!("{} produced no result", r.name())))
    }

    /// Sum of all elements
    pub fn sum(&self) -> Result<T> {
        self.reduce_one(Reduction::Sum)
    }

    /// Mean of all elements
    pub fn mean(&self) -> Result<T> {
        self.reduce_one(Reduction::Mean)
    }

    /// Largest element; `InvalidArgument` when empty
    pub fn max(&self) -> Result<T> {
        self.reduce_one(Reduction::Max)
    }

    /// Smallest element; `InvalidArgument` when empty
    pub fn min(&self) -> Result<T> {
        self.reduce_one(Reduction::Min)
    }

    /// Flat index of the largest element (first on ties), cast to `T`
    pub fn argmax(&self) -> Result<T> {
        self.reduce_one(Reduction::ArgMax)
    }

    /// Flat index of the smallest element (first on ties), cast to `T`
    pub fn argmin(&self) -> Result<T> {
        self.reduce_one(Reduction::ArgMin)
    }

    /// Element count of the evaluated tensor, cast to `T`
    pub fn count(&self) -> Result<T> {
        self.reduce_one(Reduction::Len)
    }
}

impl<T: Element> From<Storage<T>> for Tensor<T> {
    fn from(storage: Storage<T>) -> Self {
        Self::from_storage(storage)
    }
}

impl<T: Element> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("storage", &self.storage)
            .field("pending", &self.pending)
            .finish()
    }
}

/// Nested-bracket rendering of the stored data; pending ops are not applied
impl<T: Element> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nested(f, self.storage.data(), self.storage.shape(), 0)?;
        if !self.pending.is_empty() {
            write!(f, " (+{} pending)", self.pending.len())?;
        }
        Ok(())
    }
}

fn write_nested<T: Element>(
    f: &mut fmt::Formatter<'_>,
    data: &[T],
    shape: &[usize],
    depth: usize,
) -> fmt::Result {
    let Some((&dim, inner)) = shape.split_first() else {
        return match data.first() {
            Some(v) => write!(f, "{}", v),
            None => f.write_str("[]"),
        };
    };

    let step: usize = inner.iter().product();
    f.write_str("[")?;
    for i in 0..dim {
        if i > 0 {
            if inner.is_empty() {
                f.write_str(", ")?;
            } else {
                write!(f, ",\n{:indent$}", "", indent = depth + 1)?;
            }
        }
        if inner.is_empty() {
            write!(f, "{}", data[i])?;
        } else {
            write_nested(f, &data[i * step..(i + 1) * step], inner, depth + 1)?;
        }
    }
    f.write_str("]")
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident) => {
        impl<T: Element> std::ops::$trait<&Tensor<T>> for &Tensor<T> {
            type Output = Tensor<T>;

            fn $method(self, rhs: &Tensor<T>) -> Tensor<T> {
                Tensor::$method(self, rhs)
            }
        }

        impl<T: Element> std::ops::$trait<Tensor<T>> for Tensor<T> {
            type Output = Tensor<T>;

            fn $method(self, rhs: Tensor<T>) -> Tensor<T> {
                Tensor::$method(&self, &rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add);
impl_binary_operator!(Sub, sub);
impl_binary_operator!(Mul, mul);
impl_binary_operator!(Div, div);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_until_evaluate() {
        let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]).unwrap();
        let one = Tensor::from_slice(&[1.0f32], &[1]).unwrap();
        let two = Tensor::full(2.0f32, &[1]);

        let lazy = a.add(&one).mul(&two);
        assert_eq!(lazy.pending_ops(), 2);
        assert_eq!(lazy.storage().data(), &[1.0, 2.0, 3.0]);

        let done = lazy.evaluate().unwrap();
        assert!(done.is_evaluated());
        assert_eq!(done.storage().data(), &[4.0, 6.0, 8.0]);
        // the source tensor shares nothing with the evaluated copy
        assert_eq!(a.storage().data(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_operators_and_unary() {
        let a = Tensor::from_slice(&[4.0f64, 9.0, 16.0], &[3]).unwrap();
        let b = Tensor::ones(&[3]);
        let r = (&a - &b).evaluate().unwrap();
        assert_eq!(r.to_vec().unwrap(), vec![3.0, 8.0, 15.0]);

        let s = a.sqrt().evaluate().unwrap();
        assert_eq!(s.to_vec().unwrap(), vec![2.0, 3.0, 4.0]);
        assert_eq!(s.shape(), &[3]);
    }

    #[test]
    fn test_reshape_and_reductions_see_pending_ops() {
        let a = Tensor::<i32>::arange(6);
        let lazy = a.scalar_op(BinaryOp::Mul, 10);
        let r = lazy.reshape(&[2, 3]).unwrap();
        assert!(r.is_evaluated());
        assert_eq!(r.storage().data(), &[0, 10, 20, 30, 40, 50]);
        assert_eq!(lazy.sum().unwrap(), 150);
        assert_eq!(lazy.pending_ops(), 1);

        assert!(matches!(a.reshape(&[4]), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_failed_evaluate_keeps_state() {
        let mut a = Tensor::from_slice(&[1.0f64, 2.0, 3.0], &[3]).unwrap();
        let b = Tensor::zeros(&[2]);
        a = a.add(&b);
        assert!(matches!(a.eval_in_place(), Err(Error::BroadcastError { .. })));
        assert_eq!(a.pending_ops(), 1);
        assert_eq!(a.storage().data(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_random() {
        let r = Tensor::<f64>::random_seeded(-1.0, 1.0, &[10, 2], 7).unwrap();
        assert_eq!(r.shape(), &[10, 2]);
        assert!(r.storage().data().iter().all(|&v| (-1.0..1.0).contains(&v)));
        let again = Tensor::<f64>::random_seeded(-1.0, 1.0, &[10, 2], 7).unwrap();
        assert_eq!(r.storage(), again.storage());

        assert!(matches!(
            Tensor::<i32>::random(0, 10, &[3]),
            Err(Error::UnsupportedDType { .. })
        ));
        assert!(matches!(
            Tensor::<f32>::random(1.0, 1.0, &[3]),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_display() {
        let t = Tensor::from_slice(&[1, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        assert_eq!(t.to_string(), "[[1, 2, 3],\n [4, 5, 6]]");
        assert_eq!(Tensor::from_slice(&[7u8], &[1]).unwrap().to_string(), "[7]");
        let lazy = t.map_with(&t, |a, b| a + b);
        assert!(lazy.to_string().ends_with("(+1 pending)"));
    }
}
