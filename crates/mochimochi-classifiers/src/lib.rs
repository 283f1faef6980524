//! mochimochi-classifiers: online margin-based linear classifiers.
//!
//! Every learner consumes one labeled example at a time and never stores the
//! training set. The crate provides the Passive-Aggressive family (PA, PA-I,
//! PA-II), the confidence-weighted family (AROW, NHERD, SCW), AdaGrad-RDA
//! and Adam behind the `OnlineClassifier` trait, a `BinaryModel` enum built
//! from a `ModelConfig`, a multiclass Passive-Aggressive composer, JSON model
//! files and a sparse `label idx:value` example reader.
pub mod config;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod multiclass;

pub use error::ClassifierError;
pub use math::FeatureVector;
pub use models::{build_model, load_model, BinaryModel, OnlineClassifier};
pub use multiclass::MulticlassPA;
