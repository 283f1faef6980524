use std::ops::{Index, IndexMut};
use std::slice::{Iter, IterMut};

use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

/// Dense real-valued input to every classifier.
pub type FeatureVector = Array1<f64>;

/// Owned one-dimensional buffer. Serialized as a plain JSON array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Array1<T> {
    data: Vec<T>,
}

impl<T> Array1<T> {
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.data.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.clone()
    }
}

impl<T: Clone + Zero + One> Array1<T> {
    pub fn zeros(len: usize) -> Self {
        Self::from_vec(vec![T::zero(); len])
    }

    /// Initial diagonal covariance.
    pub fn ones(len: usize) -> Self {
        Self::from_vec(vec![T::one(); len])
    }
}

impl<T> FromIterator<T> for Array1<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T> Index<usize> for Array1<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for Array1<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl Array1<f64> {
    /// Inner product. Both operands must have the same dimension.
    pub fn dot(&self, other: &Array1<f64>) -> f64 {
        assert_eq!(
            self.len(),
            other.len(),
            "Dot product requires equal length vectors"
        );
        self.iter().zip(other.iter()).map(|(a, b)| a * b).sum()
    }

    /// `‖self‖²`
    pub fn squared_norm(&self) -> f64 {
        self.iter().map(|v| v * v).sum()
    }

    /// In-place `self += scale * other`.
    pub fn scaled_add(&mut self, scale: f64, other: &Array1<f64>) {
        assert_eq!(
            self.len(),
            other.len(),
            "scaled_add requires equal length vectors"
        );
        for (a, b) in self.iter_mut().zip(other.iter()) {
            *a += scale * b;
        }
    }

    /// True when every entry is finite (no NaN or infinity).
    pub fn is_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }
}
