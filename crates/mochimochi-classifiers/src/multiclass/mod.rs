//! Multiclass composition of Passive-Aggressive weight vectors.
pub mod mpa;

pub use mpa::MulticlassPA;
