//! Ordered collection of eigenpairs computed at one parameter value.
//!
//! Insertion order defines the mode index. Every pair in a set shares the
//! same eigenvector dimension; the first pair fixes it.

use std::cmp::Ordering;
use std::ops::Index;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::eigenpair::EigenPair;
use crate::error::{Result, TrackingError};
use crate::traits::Complex64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeSet {
    pairs: Vec<EigenPair>,
}

impl ModeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(capacity),
        }
    }

    /// Builds a set from pairs, checking that all dimensions agree.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = EigenPair>,
    {
        let mut set = Self::new();
        for pair in pairs {
            set.add_pair(pair)?;
        }
        Ok(set)
    }

    /// Builds a set from aligned eigenvalues and an eigenvector matrix whose
    /// columns are the eigenvectors.
    pub fn from_columns(values: &[Complex64], vectors: &DMatrix<Complex64>) -> Result<Self> {
        if values.len() != vectors.ncols() {
            return Err(TrackingError::DimensionMismatch {
                expected: values.len(),
                actual: vectors.ncols(),
            });
        }
        let pairs = values.iter().zip(vectors.column_iter()).map(|(&value, column)| {
            EigenPair::from_complex(value, column.iter().copied().collect())
        });
        Self::try_from_pairs(pairs)
    }

    pub fn from_real_columns(values: &[f64], vectors: &DMatrix<f64>) -> Result<Self> {
        let complex_values: Vec<Complex64> = values.iter().map(|&v| Complex::new(v, 0.0)).collect();
        let complex_vectors = vectors.map(|v| Complex::new(v, 0.0));
        Self::from_columns(&complex_values, &complex_vectors)
    }

    /// Appends a pair. Fails when its dimension differs from the pairs
    /// already in the set.
    pub fn add_pair(&mut self, pair: EigenPair) -> Result<()> {
        self.check_dimension(&pair)?;
        self.pairs.push(pair);
        Ok(())
    }

    pub fn set_pair(&mut self, index: usize, pair: EigenPair) -> Result<()> {
        if index >= self.pairs.len() {
            return Err(TrackingError::InvalidInput(format!(
                "mode index {} out of range for a set of {} modes",
                index,
                self.pairs.len()
            )));
        }
        if self.pairs.len() > 1 || index != 0 {
            self.check_dimension(&pair)?;
        }
        self.pairs[index] = pair;
        Ok(())
    }

    fn check_dimension(&self, pair: &EigenPair) -> Result<()> {
        match self.dimension() {
            Some(expected) if expected != pair.dimension() => Err(TrackingError::DimensionMismatch {
                expected,
                actual: pair.dimension(),
            }),
            _ => Ok(()),
        }
    }

    pub fn get(&self, index: usize) -> Option<&EigenPair> {
        self.pairs.get(index)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Eigenvector dimension shared by the set, or `None` when empty.
    pub fn dimension(&self) -> Option<usize> {
        self.pairs.first().map(EigenPair::dimension)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EigenPair> {
        self.pairs.iter()
    }

    pub fn pairs(&self) -> &[EigenPair] {
        &self.pairs
    }

    pub fn eigenvalues(&self) -> Vec<Complex64> {
        self.pairs.iter().map(EigenPair::value).collect()
    }

    pub fn eigenvectors(&self) -> Vec<Vec<Complex64>> {
        self.pairs.iter().map(|p| p.vector().to_vec()).collect()
    }

    pub fn eigenvalue_vector(&self) -> DVector<Complex64> {
        DVector::from_iterator(self.pairs.len(), self.pairs.iter().map(EigenPair::value))
    }

    /// Eigenvectors as the columns of an `N x M` matrix.
    pub fn eigenvector_matrix(&self) -> DMatrix<Complex64> {
        let rows = self.dimension().unwrap_or(0);
        DMatrix::from_fn(rows, self.pairs.len(), |i, j| self.pairs[j].vector()[i])
    }

    /// Stable sort of the modes with a caller supplied comparator.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&EigenPair, &EigenPair) -> Ordering,
    {
        self.pairs.sort_by(compare);
    }

    /// Keeps only the modes for which `filter` returns true.
    pub fn retain<F>(&mut self, filter: F)
    where
        F: FnMut(&EigenPair) -> bool,
    {
        self.pairs.retain(filter);
    }

    pub fn delete_mode(&mut self, index: usize) -> Result<EigenPair> {
        if index >= self.pairs.len() {
            return Err(TrackingError::InvalidInput(format!(
                "mode index {} out of range for a set of {} modes",
                index,
                self.pairs.len()
            )));
        }
        Ok(self.pairs.remove(index))
    }

    /// Removes several modes at once. Indices refer to positions before any
    /// removal; duplicates are ignored.
    pub fn delete_modes(&mut self, indices: &[usize]) -> Result<()> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&last) = sorted.last() {
            if last >= self.pairs.len() {
                return Err(TrackingError::InvalidInput(format!(
                    "mode index {} out of range for a set of {} modes",
                    last,
                    self.pairs.len()
                )));
            }
        }
        for &index in sorted.iter().rev() {
            self.pairs.remove(index);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Drops every mode whose eigenvalue has a negative imaginary part,
    /// leaving one member of each conjugate pair.
    pub fn remove_conjugates(&mut self) {
        self.pairs.retain(|p| p.value().im >= 0.0);
    }

    /// Drops modes whose eigenvalue imaginary part repeats an earlier kept
    /// mode to `digits` significant digits.
    pub fn remove_repeated_modes(&mut self, digits: i32) {
        let tolerance = 0.1_f64.powi(digits);
        let mut kept: Vec<EigenPair> = Vec::with_capacity(self.pairs.len());
        for pair in self.pairs.drain(..) {
            let im = pair.value().im;
            let repeated = kept.iter().any(|k| {
                let other = k.value().im;
                let scale = im.abs().max(other.abs());
                (im - other).abs() < tolerance * scale || (scale == 0.0 && im == other)
            });
            if !repeated {
                kept.push(pair);
            }
        }
        self.pairs = kept;
    }

    /// Keeps the first `n` modes in storage order.
    pub fn truncate(&mut self, n: usize) {
        self.pairs.truncate(n);
    }
}

impl Index<usize> for ModeSet {
    type Output = EigenPair;

    fn index(&self, index: usize) -> &Self::Output {
        &self.pairs[index]
    }
}

impl<'a> IntoIterator for &'a ModeSet {
    type Item = &'a EigenPair;
    type IntoIter = std::slice::Iter<'a, EigenPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::ModeSet;
    use crate::eigenpair::EigenPair;
    use crate::error::TrackingError;
    use nalgebra::DMatrix;
    use num_complex::Complex;

    fn scalar_set(values: &[f64]) -> ModeSet {
        ModeSet::try_from_pairs(values.iter().map(|&v| EigenPair::from_real(v, &[1.0])))
            .expect("set should build")
    }

    fn real_parts(set: &ModeSet) -> Vec<f64> {
        set.eigenvalues().iter().map(|v| v.re).collect()
    }

    #[test]
    fn add_pair_rejects_mismatched_dimension() {
        let mut set = ModeSet::new();
        set.add_pair(EigenPair::from_real(1.0, &[1.0, 0.0])).expect("first pair");
        let err = set
            .add_pair(EigenPair::from_real(2.0, &[1.0, 0.0, 0.0]))
            .expect_err("expected mismatch");
        assert_eq!(
            err,
            TrackingError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(set.len(), 1);
        assert_eq!(set.dimension(), Some(2));
    }

    #[test]
    fn bulk_accessors_are_aligned() {
        let mut set = ModeSet::new();
        set.add_pair(EigenPair::from_real(1.0, &[1.0, 2.0])).unwrap();
        set.add_pair(EigenPair::new(
            Complex::new(0.5, 3.0),
            &[Complex::new(0.0, 1.0), Complex::new(4.0, 0.0)],
        ))
        .unwrap();

        assert_eq!(set.eigenvalues(), vec![Complex::new(1.0, 0.0), Complex::new(0.5, 3.0)]);
        let vectors = set.eigenvectors();
        assert_eq!(vectors[1][0], Complex::new(0.0, 1.0));

        let matrix = set.eigenvector_matrix();
        assert_eq!((matrix.nrows(), matrix.ncols()), (2, 2));
        assert_eq!(matrix[(1, 0)], Complex::new(2.0, 0.0));
        assert_eq!(matrix[(0, 1)], Complex::new(0.0, 1.0));
        assert_eq!(set.eigenvalue_vector()[1], Complex::new(0.5, 3.0));
        assert_eq!(set[0].value(), Complex::new(1.0, 0.0));
    }

    #[test]
    fn empty_set_exports_empty_matrices() {
        let set = ModeSet::new();
        assert!(set.is_empty());
        assert_eq!(set.dimension(), None);
        let matrix = set.eigenvector_matrix();
        assert_eq!((matrix.nrows(), matrix.ncols()), (0, 0));
        assert!(set.get(0).is_none());
    }

    #[test]
    fn from_real_columns_reads_one_mode_per_column() {
        let vectors = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.5, 0.0, 1.0, 0.5]);
        let set = ModeSet::from_real_columns(&[1.0, 2.0, 3.0], &vectors).expect("set should build");
        assert_eq!(set.len(), 3);
        assert_eq!(set[2].vector(), &[Complex::new(0.5, 0.0), Complex::new(0.5, 0.0)]);

        let err = ModeSet::from_real_columns(&[1.0], &vectors).expect_err("expected mismatch");
        assert!(matches!(err, TrackingError::DimensionMismatch { expected: 1, actual: 3 }));
    }

    #[test]
    fn sort_orders_by_real_and_imaginary_parts() {
        let mut set = scalar_set(&[9.0, 1.0, 2.0, 4.0, 5.0, 3.0, 6.0, 10.0, 7.0, 8.0]);
        set.sort_by(|a, b| a.value().re.total_cmp(&b.value().re));
        assert_eq!(real_parts(&set), (1..=10).map(f64::from).collect::<Vec<_>>());

        let mut complex = ModeSet::try_from_pairs(
            [3.0, 1.0, 2.0]
                .iter()
                .map(|&im| EigenPair::new(Complex::new(0.0, im), &[1.0])),
        )
        .unwrap();
        complex.sort_by(|a, b| a.value().im.total_cmp(&b.value().im));
        let imag: Vec<f64> = complex.eigenvalues().iter().map(|v| v.im).collect();
        assert_eq!(imag, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn retain_keeps_window_in_original_order() {
        let mut set = scalar_set(&[9.0, 1.0, 2.0, 4.0, 5.0, 3.0, 6.0, 10.0, 7.0, 8.0]);
        set.retain(|p| (2.0..=5.0).contains(&p.value().re));
        assert_eq!(real_parts(&set), vec![2.0, 4.0, 5.0, 3.0]);
    }

    #[test]
    fn delete_modes_uses_original_indices() {
        let mut set = scalar_set(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let removed = set.delete_mode(1).expect("index in range");
        assert_eq!(removed.value().re, 2.0);
        assert_eq!(real_parts(&set), vec![1.0, 3.0, 4.0, 5.0, 6.0]);

        set.delete_modes(&[3, 1, 3]).expect("indices in range");
        assert_eq!(real_parts(&set), vec![1.0, 4.0, 6.0]);

        assert!(set.delete_modes(&[0, 7]).is_err());
        assert_eq!(set.len(), 3);
        assert!(set.delete_mode(3).is_err());
    }

    #[test]
    fn truncate_and_clear() {
        let mut set = scalar_set(&[1.0, 2.0, 3.0, 4.0]);
        set.truncate(10);
        assert_eq!(set.len(), 4);
        set.truncate(2);
        assert_eq!(real_parts(&set), vec![1.0, 2.0]);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn remove_conjugates_keeps_non_negative_imaginary_parts() {
        let mut set = ModeSet::try_from_pairs(
            [2.0, -2.0, 0.0, 5.0, -5.0]
                .iter()
                .map(|&im| EigenPair::new(Complex::new(-0.1, im), &[1.0])),
        )
        .unwrap();
        set.remove_conjugates();
        let imag: Vec<f64> = set.eigenvalues().iter().map(|v| v.im).collect();
        assert_eq!(imag, vec![2.0, 0.0, 5.0]);
    }

    #[test]
    fn remove_repeated_modes_respects_significant_digits() {
        let mut set = ModeSet::try_from_pairs(
            [10.0, 10.0001, 12.0, 10.5, 0.0, 0.0]
                .iter()
                .map(|&im| EigenPair::new(Complex::new(0.0, im), &[1.0])),
        )
        .unwrap();
        set.remove_repeated_modes(3);
        let imag: Vec<f64> = set.eigenvalues().iter().map(|v| v.im).collect();
        assert_eq!(imag, vec![10.0, 12.0, 10.5, 0.0]);
    }

    #[test]
    fn set_pair_checks_index_and_dimension() {
        let mut set = scalar_set(&[1.0, 2.0]);
        set.set_pair(1, EigenPair::from_real(7.0, &[2.0])).expect("valid replacement");
        assert_eq!(set[1].value().re, 7.0);
        assert!(set.set_pair(2, EigenPair::from_real(0.0, &[1.0])).is_err());
        assert!(matches!(
            set.set_pair(0, EigenPair::from_real(0.0, &[1.0, 1.0])),
            Err(TrackingError::DimensionMismatch { .. })
        ));

        let mut single = scalar_set(&[1.0]);
        single
            .set_pair(0, EigenPair::from_real(3.0, &[1.0, 0.0]))
            .expect("sole pair may change dimension");
        assert_eq!(single.dimension(), Some(2));
    }
}
