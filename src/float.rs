//! Floating point abstraction.

use std::{fmt::Debug, iter::Sum};

use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};

/// Sample type supported by the transform.
///
/// Implemented for `f32` and `f64`.
pub trait StarletFloat:
    Float + FromPrimitive + ToPrimitive + NumAssign + Sum + Debug + Default + Send + Sync + 'static
{
    /// Converts an `f64` constant into the sample type.
    fn from_f64_c(val: f64) -> Self;

    /// Widens the sample into an `f64`.
    fn to_f64_c(self) -> f64;
}

impl StarletFloat for f32 {
    #[inline]
    fn from_f64_c(val: f64) -> Self {
        val as f32
    }

    #[inline]
    fn to_f64_c(self) -> f64 {
        self as f64
    }
}

impl StarletFloat for f64 {
    #[inline]
    fn from_f64_c(val: f64) -> Self {
        val
    }

    #[inline]
    fn to_f64_c(self) -> f64 {
        self
    }
}
