use num_complex::Complex;
use std::fmt::Debug;

use crate::error::Result;

/// Canonical scalar used for eigenvalues and eigenvector components.
/// Real inputs are stored with a zero imaginary part.
pub type Complex64 = Complex<f64>;

/// A trait for values that can be used as eigenvalues or eigenvector entries.
/// Every implementor converts losslessly (or by widening) into [`Complex64`].
pub trait ModalScalar: Copy + Debug {
    fn into_complex(self) -> Complex64;
}

impl ModalScalar for f64 {
    fn into_complex(self) -> Complex64 {
        Complex::new(self, 0.0)
    }
}

impl ModalScalar for f32 {
    fn into_complex(self) -> Complex64 {
        Complex::new(f64::from(self), 0.0)
    }
}

impl ModalScalar for Complex<f64> {
    fn into_complex(self) -> Complex64 {
        self
    }
}

impl ModalScalar for Complex<f32> {
    fn into_complex(self) -> Complex64 {
        Complex::new(f64::from(self.re), f64::from(self.im))
    }
}

/// Scores how well two eigenvectors correspond.
///
/// Implementations must return a value in `[0, 1]` that is symmetric in its
/// arguments and insensitive to a complex scale factor on either vector.
pub trait SimilarityMetric: Sync {
    /// Returns the similarity between `a` and `b`.
    /// Fails with a dimension mismatch when the lengths differ.
    fn score(&self, a: &[Complex64], b: &[Complex64]) -> Result<f64>;
}
