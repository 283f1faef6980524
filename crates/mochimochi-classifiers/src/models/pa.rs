use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, check_positive, ClassifierError};
use crate::io::model_file;
use crate::math::FeatureVector;
use crate::models::classifier_trait::OnlineClassifier;
use crate::models::utils::hinge_loss;

/// Step size policy of the Passive-Aggressive family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaMode {
    /// select 0: unbounded aggressiveness.
    Pa,
    /// select 1: step clipped at `C`.
    PaI,
    /// select 2: step softened by `1 / (2C)`.
    PaII,
}

impl PaMode {
    pub fn from_select(select: i32) -> Result<Self, ClassifierError> {
        match select {
            0 => Ok(PaMode::Pa),
            1 => Ok(PaMode::PaI),
            2 => Ok(PaMode::PaII),
            other => Err(ClassifierError::InvalidMode {
                name: "select",
                value: i64::from(other),
            }),
        }
    }

    pub fn select(self) -> i32 {
        match self {
            PaMode::Pa => 0,
            PaMode::PaI => 1,
            PaMode::PaII => 2,
        }
    }

    /// Closed-form step size for a hinge `loss` and a feature of squared
    /// norm `squared_norm`.
    ///
    /// A zero norm yields `0` for PA and `C` for PA-I instead of an
    /// undefined ratio. PA-II is always finite for `C > 0`.
    pub fn tau(self, loss: f64, squared_norm: f64, c: f64) -> f64 {
        match self {
            PaMode::Pa => {
                if squared_norm == 0.0 {
                    0.0
                } else {
                    loss / squared_norm
                }
            }
            PaMode::PaI => {
                if squared_norm == 0.0 {
                    c
                } else {
                    c.min(loss / squared_norm)
                }
            }
            PaMode::PaII => loss / (squared_norm + 1.0 / (2.0 * c)),
        }
    }
}

/// Passive-Aggressive binary classifier (PA, PA-I, PA-II).
///
/// `update` always applies the move `tau * label * x`, which is the zero
/// vector when the hinge loss is zero, and always reports `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct PassiveAggressive {
    dim: usize,
    c: f64,
    mode: PaMode,
    weight: FeatureVector,
}

#[derive(Serialize, Deserialize)]
struct PaState {
    weight: FeatureVector,
    dimension: usize,
    #[serde(rename = "C")]
    c: f64,
    select: i32,
}

impl PassiveAggressive {
    pub const NAME: &'static str = "PA";

    pub fn new(dim: usize, c: f64, select: i32) -> Result<Self, ClassifierError> {
        check_dimension(dim)?;
        check_positive("C", c)?;
        let mode = PaMode::from_select(select)?;
        Ok(PassiveAggressive {
            dim,
            c,
            mode,
            weight: FeatureVector::zeros(dim),
        })
    }

    pub fn weight(&self) -> &FeatureVector {
        &self.weight
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn mode(&self) -> PaMode {
        self.mode
    }

    fn to_state(&self) -> PaState {
        PaState {
            weight: self.weight.clone(),
            dimension: self.dim,
            c: self.c,
            select: self.mode.select(),
        }
    }

    fn from_state(state: PaState) -> Result<Self, ClassifierError> {
        let mut model = PassiveAggressive::new(state.dimension, state.c, state.select)?;
        if state.weight.len() != state.dimension {
            return Err(ClassifierError::DimensionMismatch {
                expected: state.dimension,
                found: state.weight.len(),
            });
        }
        model.weight = state.weight;
        Ok(model)
    }

    /// Restore a classifier directly from a model file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let state: PaState = model_file::load_record(path, Self::NAME)?;
        Ok(Self::from_state(state)?)
    }
}

impl OnlineClassifier for PassiveAggressive {
    fn update(&mut self, feature: &FeatureVector, label: i32) -> bool {
        let loss = hinge_loss(self.margin(feature), label);
        let tau = self.mode.tau(loss, feature.squared_norm(), self.c);
        self.weight.scaled_add(tau * f64::from(label), feature);
        log::trace!("PA update: loss={} tau={}", loss, tau);
        true
    }

    fn margin(&self, feature: &FeatureVector) -> f64 {
        self.weight.dot(feature)
    }

    fn save(&self, path: &Path) -> Result<()> {
        model_file::save_record(path, Self::NAME, &self.to_state())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        *self = Self::from_file(path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector::from_vec(values.to_vec())
    }

    #[test]
    fn rejects_invalid_construction() {
        assert!(PassiveAggressive::new(0, 1.0, 2).is_err());
        assert!(PassiveAggressive::new(3, 0.0, 2).is_err());
        assert!(PassiveAggressive::new(3, -1.0, 1).is_err());
        assert_eq!(
            PassiveAggressive::new(3, 1.0, 3).unwrap_err(),
            ClassifierError::InvalidMode {
                name: "select",
                value: 3
            }
        );
    }

    #[test]
    fn tau_policies() {
        assert_eq!(PaMode::Pa.tau(1.0, 4.0, 0.1), 0.25);
        assert_eq!(PaMode::PaI.tau(1.0, 4.0, 0.1), 0.1);
        assert_eq!(PaMode::PaI.tau(1.0, 4.0, 10.0), 0.25);
        assert_eq!(PaMode::PaII.tau(1.0, 4.0, 0.5), 1.0 / 5.0);
    }

    #[test]
    fn tau_guards_zero_norm() {
        assert_eq!(PaMode::Pa.tau(1.0, 0.0, 0.7), 0.0);
        assert_eq!(PaMode::PaI.tau(1.0, 0.0, 0.7), 0.7);
        assert!(PaMode::PaII.tau(1.0, 0.0, 0.7).is_finite());
    }

    #[test]
    fn first_update_reaches_unit_margin() {
        let mut pa = PassiveAggressive::new(2, 1.0, 0).unwrap();
        let x = fv(&[1.0, 2.0]);
        assert!(pa.update(&x, 1));
        assert!((pa.margin(&x) - 1.0).abs() < 1e-12);
        assert_eq!(pa.predict(&x), 1);
    }

    #[test]
    fn zero_loss_update_reports_true_without_moving() {
        let mut pa = PassiveAggressive::new(2, 1.0, 1).unwrap();
        let x = fv(&[1.0, 0.0]);
        pa.update(&x, 1);
        pa.update(&x, 1);
        let before = pa.weight().clone();
        assert!(pa.margin(&x) >= 1.0 - 1e-12);
        let big = fv(&[5.0, 0.0]);
        assert!(pa.update(&big, 1));
        assert_eq!(pa.weight(), &before);
    }

    #[test]
    fn untrained_model_predicts_positive() {
        let pa = PassiveAggressive::new(3, 1.0, 2).unwrap();
        assert_eq!(pa.predict(&fv(&[0.3, -0.2, 1.0])), 1);
    }
}
