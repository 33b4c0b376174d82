//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Sub};

/// Trait for types that can be elements of a storage
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - values cross worker threads freely
/// - `Pod + Zeroable` - lets kernels reinterpret `&[T]` as `&[f32]`/`&[f64]`
///   (bytemuck) once the dtype tag has been matched
/// - `Add + Sub + Mul + Div` - arithmetic operations (Output = Self)
/// - `PartialOrd` - comparison for max/min/argmax/argmin
///
/// Transcendental operations (pow, sqrt, sin, cos) go through `to_f64`/`from_f64`
/// on the scalar path.
///
/// Elementwise arithmetic goes through the total `*_elem` methods instead of
/// the operator traits: integers wrap on overflow and division by zero
/// yields zero, so no kernel can panic halfway through a buffer.
pub trait Element:
    Copy
    + Send
    + Sync
    + Pod
    + Zeroable
    + Debug
    + Display
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type (saturating for integers)
    fn from_f64(v: f64) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;

    /// `self + rhs`, wrapping for integers
    fn add_elem(self, rhs: Self) -> Self;

    /// `self - rhs`, wrapping for integers
    fn sub_elem(self, rhs: Self) -> Self;

    /// `self * rhs`, wrapping for integers
    fn mul_elem(self, rhs: Self) -> Self;

    /// `self / rhs`; integer division truncates, wraps on `MIN / -1`
    /// and gives zero for a zero divisor
    fn div_elem(self, rhs: Self) -> Self;

    /// Widen for exact integer accumulation (floats truncate toward zero)
    fn to_i128(self) -> i128;

    /// Narrow an accumulated value, wrapping for integers
    fn from_i128(v: i128) -> Self;
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr, $zero:expr, $one:expr, { $($arith:tt)* }) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $ty
            }

            #[inline]
            fn zero() -> Self {
                $zero
            }

            #[inline]
            fn one() -> Self {
                $one
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }

            #[inline]
            fn from_i128(v: i128) -> Self {
                v as $ty
            }

            $($arith)*
        }
    };
}

macro_rules! float_arith {
    () => {
        #[inline]
        fn add_elem(self, rhs: Self) -> Self {
            self + rhs
        }

        #[inline]
        fn sub_elem(self, rhs: Self) -> Self {
            self - rhs
        }

        #[inline]
        fn mul_elem(self, rhs: Self) -> Self {
            self * rhs
        }

        #[inline]
        fn div_elem(self, rhs: Self) -> Self {
            self / rhs
        }
    };
}

macro_rules! int_arith {
    () => {
        #[inline]
        fn add_elem(self, rhs: Self) -> Self {
            self.wrapping_add(rhs)
        }

        #[inline]
        fn sub_elem(self, rhs: Self) -> Self {
            self.wrapping_sub(rhs)
        }

        #[inline]
        fn mul_elem(self, rhs: Self) -> Self {
            self.wrapping_mul(rhs)
        }

        #[inline]
        fn div_elem(self, rhs: Self) -> Self {
            if rhs == 0 { 0 } else { self.wrapping_div(rhs) }
        }
    };
}

impl_element!(f64, DType::F64, 0.0, 1.0, { float_arith!(); });
impl_element!(f32, DType::F32, 0.0, 1.0, { float_arith!(); });
impl_element!(i64, DType::I64, 0, 1, { int_arith!(); });
impl_element!(i32, DType::I32, 0, 1, { int_arith!(); });
impl_element!(u32, DType::U32, 0, 1, { int_arith!(); });
impl_element!(u8, DType::U8, 0, 1, { int_arith!(); });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_tags() {
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(f64::DTYPE, DType::F64);
        assert_eq!(i32::DTYPE, DType::I32);
        assert_eq!(u8::DTYPE, DType::U8);
    }

    #[test]
    fn test_f64_roundtrip_saturates_integers() {
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(i32::from_f64(-2.7), -2);
        assert_eq!(f32::from_f64(1.5).to_f64(), 1.5);
    }

    #[test]
    fn test_integer_arithmetic_is_total() {
        assert_eq!(7i32.div_elem(0), 0);
        assert_eq!(i32::MIN.div_elem(-1), i32::MIN);
        assert_eq!(250u8.add_elem(10), 4);
        assert_eq!(0u32.sub_elem(1), u32::MAX);
        assert_eq!(i64::MAX.mul_elem(2), -2);
        assert!(1.0f64.div_elem(0.0).is_infinite());
    }

    #[test]
    fn test_i128_widening() {
        assert_eq!(i64::MAX.to_i128() + 1, 1i128 << 63);
        assert_eq!(i64::from_i128(1i128 << 64), 0);
        assert_eq!(u8::from_i128(300), 44);
    }
}
