//! Modal Assurance Criterion and the pairwise similarity matrix between two
//! mode sets.

use nalgebra::DMatrix;
use num_traits::Zero;

use crate::error::{Result, TrackingError};
use crate::mode_set::ModeSet;
use crate::traits::{Complex64, SimilarityMetric};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Modal Assurance Criterion:
/// `|a^H b|^2 / ((a^H a) (b^H b))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mac;

impl SimilarityMetric for Mac {
    fn score(&self, a: &[Complex64], b: &[Complex64]) -> Result<f64> {
        mac(a, b)
    }
}

/// Computes the MAC between two eigenvectors.
///
/// Returns `0.0` when either vector has zero norm. Each vector is divided by
/// its largest component before accumulating, so the score stays accurate for
/// magnitudes that would overflow or underflow when squared. The result is
/// clamped to `[0, 1]`; a non-finite result (from non-finite input) scores
/// `0.0`.
pub fn mac(a: &[Complex64], b: &[Complex64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(TrackingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let scale_a = max_component(a);
    let scale_b = max_component(b);
    if scale_a == 0.0 || scale_b == 0.0 {
        return Ok(0.0);
    }

    let mut cross = Complex64::zero();
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let x = *x / scale_a;
        let y = *y / scale_b;
        cross += x.conj() * y;
        norm_a += x.norm_sqr();
        norm_b += y.norm_sqr();
    }

    let value = cross.norm_sqr() / (norm_a * norm_b);
    if !value.is_finite() {
        return Ok(0.0);
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Largest absolute real or imaginary part of any component.
fn max_component(v: &[Complex64]) -> f64 {
    v.iter().fold(0.0_f64, |m, c| m.max(c.re.abs()).max(c.im.abs()))
}

/// Builds the `R x C` matrix of scores between every reference mode (rows)
/// and every candidate mode (columns).
pub fn similarity_matrix<M: SimilarityMetric>(
    reference: &ModeSet,
    candidate: &ModeSet,
    metric: &M,
) -> Result<DMatrix<f64>> {
    let rows = reference.len();
    let cols = candidate.len();

    #[cfg(feature = "rayon")]
    let row_scores: Vec<Vec<f64>> = reference
        .pairs()
        .par_iter()
        .map(|r| score_row(r.vector(), candidate, metric))
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "rayon"))]
    let row_scores: Vec<Vec<f64>> = reference
        .iter()
        .map(|r| score_row(r.vector(), candidate, metric))
        .collect::<Result<_>>()?;

    let mut matrix = DMatrix::zeros(rows, cols);
    for (i, scores) in row_scores.into_iter().enumerate() {
        for (j, score) in scores.into_iter().enumerate() {
            matrix[(i, j)] = score;
        }
    }
    Ok(matrix)
}

fn score_row<M: SimilarityMetric>(
    reference: &[Complex64],
    candidate: &ModeSet,
    metric: &M,
) -> Result<Vec<f64>> {
    candidate
        .iter()
        .map(|c| metric.score(reference, c.vector()))
        .collect()
}
