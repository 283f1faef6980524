use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::MulticlassConfig;
use crate::error::{check_dimension, check_positive, ClassifierError};
use crate::io::{model_file, svmlight};
use crate::math::FeatureVector;
use crate::models::pa::PaMode;

/// Multiclass Passive-Aggressive classifier.
///
/// Keeps one weight vector per class. A correction moves the true class
/// towards the example and the highest-scoring wrong class away from it,
/// until the true class leads by a unit margin.
#[derive(Debug, Clone, PartialEq)]
pub struct MulticlassPA {
    dim: usize,
    n_class: usize,
    c: f64,
    mode: PaMode,
    weights: Vec<FeatureVector>,
}

#[derive(Serialize, Deserialize)]
struct MpaState {
    weights: Vec<FeatureVector>,
    dimension: usize,
    n_class: usize,
    #[serde(rename = "C")]
    c: f64,
    select: i32,
}

impl MulticlassPA {
    pub const NAME: &'static str = "MPA";

    pub fn new(dim: usize, n_class: usize, c: f64, select: i32) -> Result<Self, ClassifierError> {
        check_dimension(dim)?;
        if n_class < 2 {
            return Err(ClassifierError::invalid(
                "n_class",
                format!("at least two classes are required, got {}", n_class),
            ));
        }
        check_positive("C", c)?;
        let mode = PaMode::from_select(select)?;
        Ok(MulticlassPA {
            dim,
            n_class,
            c,
            mode,
            weights: vec![FeatureVector::zeros(dim); n_class],
        })
    }

    pub fn from_config(config: &MulticlassConfig) -> Result<Self, ClassifierError> {
        Self::new(config.dim, config.n_class, config.c, config.select)
    }

    pub fn config(&self) -> MulticlassConfig {
        MulticlassConfig {
            dim: self.dim,
            n_class: self.n_class,
            c: self.c,
            select: self.mode.select(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn n_class(&self) -> usize {
        self.n_class
    }

    pub fn weights(&self) -> &[FeatureVector] {
        &self.weights
    }

    pub fn name(&self) -> &str {
        Self::NAME
    }

    /// Per-class scores `w_k · x`.
    pub fn scores(&self, feature: &FeatureVector) -> Vec<f64> {
        self.weights.iter().map(|w| w.dot(feature)).collect()
    }

    /// Index of the best-scoring class; ties go to the lowest index.
    pub fn predict(&self, feature: &FeatureVector) -> usize {
        argmax(&self.scores(feature), None)
    }

    /// Learn from one example of class `label`. Returns whether a correction
    /// moved the weights; a margin violation on the zero vector moves nothing.
    pub fn update(&mut self, feature: &FeatureVector, label: usize) -> Result<bool, ClassifierError> {
        if label >= self.n_class {
            return Err(ClassifierError::InvalidLabel(label as i64));
        }

        let scores = self.scores(feature);
        let rival = argmax(&scores, Some(label));
        let loss = (1.0 - (scores[label] - scores[rival])).max(0.0);
        let squared_norm = feature.squared_norm();
        if loss <= 0.0 || squared_norm == 0.0 {
            return Ok(false);
        }

        // both class vectors move by x, so the joint squared norm doubles
        let tau = self.mode.tau(loss, 2.0 * squared_norm, self.c);
        self.weights[label].scaled_add(tau, feature);
        self.weights[rival].scaled_add(-tau, feature);
        log::trace!(
            "MPA update: label={} rival={} loss={} tau={}",
            label,
            rival,
            loss,
            tau
        );
        Ok(true)
    }

    /// Parse one `class idx:value ...` line and learn from it.
    pub fn train_line(&mut self, line: &str) -> Result<bool> {
        let (label, feature) = svmlight::parse_line(line, self.dim)?;
        let label = usize::try_from(label).map_err(|_| ClassifierError::InvalidLabel(label))?;
        Ok(self.update(&feature, label)?)
    }

    pub fn infer_line(&self, line: &str) -> Result<usize> {
        let (_, feature) = svmlight::parse_line(line, self.dim)?;
        Ok(self.predict(&feature))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let state = MpaState {
            weights: self.weights.clone(),
            dimension: self.dim,
            n_class: self.n_class,
            c: self.c,
            select: self.mode.select(),
        };
        model_file::save_record(path, Self::NAME, &state)
    }

    /// Replace this composer, hyper parameters included, with the stored one.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        *self = Self::from_file(path)?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let state: MpaState = model_file::load_record(path, Self::NAME)?;
        let mut model = MulticlassPA::new(state.dimension, state.n_class, state.c, state.select)?;
        if state.weights.len() != state.n_class {
            return Err(ClassifierError::DimensionMismatch {
                expected: state.n_class,
                found: state.weights.len(),
            }
            .into());
        }
        if let Some(bad) = state.weights.iter().find(|w| w.len() != state.dimension) {
            return Err(ClassifierError::DimensionMismatch {
                expected: state.dimension,
                found: bad.len(),
            }
            .into());
        }
        model.weights = state.weights;
        Ok(model)
    }
}

/// First index of the maximum, optionally ignoring one index.
fn argmax(scores: &[f64], skip: Option<usize>) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if Some(idx) == skip {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector::from_vec(values.to_vec())
    }

    #[test]
    fn rejects_invalid_construction() {
        assert!(MulticlassPA::new(0, 3, 1.0, 2).is_err());
        assert!(MulticlassPA::new(2, 1, 1.0, 2).is_err());
        assert!(MulticlassPA::new(2, 3, 0.0, 2).is_err());
        assert!(MulticlassPA::new(2, 3, 1.0, 5).is_err());
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0], None), 1);
        assert_eq!(argmax(&[0.0, 0.0, 0.0], None), 0);
        assert_eq!(argmax(&[0.0, 0.0, 0.0], Some(0)), 1);
        assert_eq!(argmax(&[5.0, 1.0, 2.0], Some(0)), 2);
    }

    #[test]
    fn untrained_model_predicts_first_class() {
        let mpa = MulticlassPA::new(3, 4, 1.0, 2).unwrap();
        assert_eq!(mpa.predict(&fv(&[1.0, -2.0, 0.5])), 0);
    }

    #[test]
    fn out_of_range_label_is_rejected() {
        let mut mpa = MulticlassPA::new(2, 3, 1.0, 2).unwrap();
        assert_eq!(
            mpa.update(&fv(&[1.0, 0.0]), 3),
            Err(ClassifierError::InvalidLabel(3))
        );
        assert!(mpa.train_line("-1 1:1").is_err());
    }

    #[test]
    fn correction_moves_true_and_rival_only() {
        let mut mpa = MulticlassPA::new(2, 3, 10.0, 1).unwrap();
        let x = fv(&[1.0, 0.0]);
        assert!(mpa.update(&x, 2).unwrap());
        // rival is class 0 (lowest index among tied wrong classes)
        assert_eq!(mpa.weights()[0].to_vec(), vec![-0.5, 0.0]);
        assert_eq!(mpa.weights()[1].to_vec(), vec![0.0, 0.0]);
        assert_eq!(mpa.weights()[2].to_vec(), vec![0.5, 0.0]);
        assert_eq!(mpa.predict(&x), 2);
    }

    #[test]
    fn leading_class_is_left_alone() {
        let mut mpa = MulticlassPA::new(2, 3, 1.0, 0).unwrap();
        let x = fv(&[1.0, 1.0]);
        let mut corrections = 0;
        while mpa.update(&x, 1).unwrap() {
            corrections += 1;
            assert!(corrections < 100, "class 1 never took the lead");
        }
        // first correction beats class 0, the next ones catch up with class 2
        assert!(corrections >= 2);
        let scores = mpa.scores(&x);
        assert!(scores[1] - scores[0] >= 1.0);
        assert!(scores[1] - scores[2] >= 1.0);
        let snapshot = mpa.clone();
        assert!(!mpa.update(&x, 1).unwrap());
        assert_eq!(mpa, snapshot);
    }

    #[test]
    fn zero_vector_reports_no_correction() {
        for select in 0..=2 {
            let mut mpa = MulticlassPA::new(2, 3, 1.0, select).unwrap();
            mpa.update(&fv(&[1.0, 0.0]), 2).unwrap();
            let snapshot = mpa.clone();
            assert!(!mpa.update(&fv(&[0.0, 0.0]), 1).unwrap());
            assert_eq!(mpa, snapshot);
        }
    }

    #[test]
    fn two_class_scenario() {
        let mut mpa = MulticlassPA::new(2, 2, 1.0, 2).unwrap();
        let a = fv(&[1.0, 0.0]);
        let b = fv(&[0.0, 1.0]);
        for _ in 0..20 {
            mpa.update(&a, 0).unwrap();
        }
        for _ in 0..20 {
            mpa.update(&b, 1).unwrap();
        }
        assert_eq!(mpa.predict(&a), 0);
        assert_eq!(mpa.predict(&b), 1);
    }
}
