//! Elementwise operation kinds

use crate::dtype::Element;
use std::fmt;
use std::sync::Arc;

/// Binary operation kind: `core = core <op> operand`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition: a + b
    Add,
    /// Subtraction: a - b
    Sub,
    /// Multiplication: a * b
    Mul,
    /// Division: a / b
    Div,
    /// Power: a^b
    Pow,
}

/// Unary operation kind: `core = op(core)`, operand value ignored
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Square root: sqrt(a)
    Sqrt,
    /// Sine: sin(a)
    Sin,
    /// Cosine: cos(a)
    Cos,
}

/// User-supplied `(core, operand) -> core` function
pub type CustomFn<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// One queued elementwise operation
///
/// Unary kinds still take an operand when queued: it participates in
/// broadcasting (and can grow the target shape) but its values are never read.
pub enum ElementwiseOp<T> {
    /// Tagged binary operation
    Binary(BinaryOp),
    /// Tagged unary operation
    Unary(UnaryOp),
    /// Opaque function, always evaluated on the scalar path
    Custom(CustomFn<T>),
}

impl<T: Element> ElementwiseOp<T> {
    /// Wrap a closure as a custom operation
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Whether the operand's values are read
    #[inline]
    pub fn reads_operand(&self) -> bool {
        !matches!(self, Self::Unary(_))
    }

    /// Scalar reference semantics for one element
    ///
    /// Every vectorized kernel must agree with this function bit for bit.
    #[inline]
    pub fn apply(&self, a: T, b: T) -> T {
        match self {
            Self::Binary(op) => op.apply(a, b),
            Self::Unary(op) => op.apply(a),
            Self::Custom(f) => f(a, b),
        }
    }
}

impl BinaryOp {
    /// Scalar semantics
    ///
    /// Total for every dtype: integer overflow wraps and integer division
    /// by zero gives zero.
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> T {
        match self {
            Self::Add => a.add_elem(b),
            Self::Sub => a.sub_elem(b),
            Self::Mul => a.mul_elem(b),
            Self::Div => a.div_elem(b),
            Self::Pow => T::from_f64(a.to_f64().powf(b.to_f64())),
        }
    }

    /// Whether vector kernels exist for this op; they must be exact, so
    /// transcendental ops stay scalar
    #[inline]
    pub const fn has_simd(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }
}

impl UnaryOp {
    /// Scalar semantics
    #[inline]
    pub fn apply<T: Element>(self, a: T) -> T {
        let x = a.to_f64();
        T::from_f64(match self {
            Self::Sqrt => x.sqrt(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
        })
    }

    /// Whether vector kernels exist for this op (IEEE sqrt is correctly rounded)
    #[inline]
    pub const fn has_simd(self) -> bool {
        matches!(self, Self::Sqrt)
    }
}

impl<T> Clone for ElementwiseOp<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Binary(op) => Self::Binary(*op),
            Self::Unary(op) => Self::Unary(*op),
            Self::Custom(f) => Self::Custom(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for ElementwiseOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(op) => write!(f, "{:?}", op),
            Self::Unary(op) => write!(f, "{:?}", op),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl<T> From<BinaryOp> for ElementwiseOp<T> {
    fn from(op: BinaryOp) -> Self {
        Self::Binary(op)
    }
}

impl<T> From<UnaryOp> for ElementwiseOp<T> {
    fn from(op: UnaryOp) -> Self {
        Self::Unary(op)
    }
}
