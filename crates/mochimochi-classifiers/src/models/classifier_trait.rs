use std::path::Path;

use anyhow::Result;

use crate::math::FeatureVector;

/// The contract every binary online learner satisfies.
///
/// Labels are `-1` / `+1`. Feature vectors must have exactly `dim()` entries;
/// a mismatched vector is a caller bug and panics.
pub trait OnlineClassifier {
    /// Observe one labeled example. Returns `true` when a correction was
    /// applied, `false` when the example already satisfied the learner's
    /// margin criterion and no state changed.
    fn update(&mut self, feature: &FeatureVector, label: i32) -> bool;

    /// Raw score `w · x` of the current primary weight vector.
    fn margin(&self, feature: &FeatureVector) -> f64;

    /// Sign of `margin`, with an exact zero resolved to `+1`.
    fn predict(&self, feature: &FeatureVector) -> i32 {
        crate::models::utils::sign_label(self.margin(feature))
    }

    /// Write the full model state (learned vectors and hyper parameters).
    fn save(&self, path: &Path) -> Result<()>;

    /// Replace the full model state, hyper parameters included, with the
    /// record stored at `path`. On error the learner is left untouched.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Stable algorithm identifier, also used as the model file tag.
    fn name(&self) -> &str;

    /// Feature dimension.
    fn dim(&self) -> usize;
}
