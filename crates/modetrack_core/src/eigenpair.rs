//! A single eigenvalue together with its eigenvector.

use serde::{Deserialize, Serialize};

use crate::traits::{Complex64, ModalScalar};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenPair {
    value: Complex64,
    vector: Vec<Complex64>,
}

impl EigenPair {
    /// Builds a pair from any supported scalar types, promoting real input to
    /// the canonical complex representation.
    pub fn new<S: ModalScalar, V: ModalScalar>(value: S, vector: &[V]) -> Self {
        Self {
            value: value.into_complex(),
            vector: vector.iter().map(|v| v.into_complex()).collect(),
        }
    }

    pub fn from_real(value: f64, vector: &[f64]) -> Self {
        Self::new(value, vector)
    }

    /// Takes ownership of an already complex eigenvector without copying it.
    pub fn from_complex(value: Complex64, vector: Vec<Complex64>) -> Self {
        Self { value, vector }
    }

    pub fn value(&self) -> Complex64 {
        self.value
    }

    pub fn vector(&self) -> &[Complex64] {
        &self.vector
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    pub fn set_value<S: ModalScalar>(&mut self, value: S) {
        self.value = value.into_complex();
    }

    pub fn set_vector<V: ModalScalar>(&mut self, vector: &[V]) {
        self.vector = vector.iter().map(|v| v.into_complex()).collect();
    }

    /// True when every eigenvector component has a zero imaginary part.
    pub fn is_real(&self) -> bool {
        self.value.im == 0.0 && self.vector.iter().all(|c| c.im == 0.0)
    }

    pub fn into_parts(self) -> (Complex64, Vec<Complex64>) {
        (self.value, self.vector)
    }
}
