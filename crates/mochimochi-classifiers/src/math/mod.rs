//! Dense vector type shared by every learner.
//!
//! `Array1` is a thin owned buffer with the handful of operations the update
//! rules need. Feature vectors are dense: sparsity is a property of the input
//! distribution, not of the representation.
pub mod vector;

pub use vector::{Array1, FeatureVector};
