use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, check_positive, ClassifierError};
use crate::io::model_file;
use crate::math::FeatureVector;
use crate::models::classifier_trait::OnlineClassifier;
use crate::models::utils::hinge_loss;

/// AdaGrad with Regularized Dual Averaging and an L1 penalty `lambda`.
///
/// Weights are recomputed from the accumulated gradients on each correction,
/// so coordinates whose average gradient stays below `lambda` are exactly zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AdagradRda {
    dim: usize,
    eta: f64,
    lambda: f64,
    timestep: u64,
    w: FeatureVector,
    h: FeatureVector,
    g: FeatureVector,
}

#[derive(Serialize, Deserialize)]
struct AdagradRdaState {
    w: FeatureVector,
    h: FeatureVector,
    g: FeatureVector,
    dimension: usize,
    eta: f64,
    lambda: f64,
    timestep: u64,
}

impl AdagradRda {
    pub const NAME: &'static str = "ADAGRAD_RDA";

    pub fn new(dim: usize, eta: f64, lambda: f64) -> Result<Self, ClassifierError> {
        check_dimension(dim)?;
        check_positive("eta", eta)?;
        check_positive("lambda", lambda)?;
        Ok(AdagradRda {
            dim,
            eta,
            lambda,
            timestep: 0,
            w: FeatureVector::zeros(dim),
            h: FeatureVector::zeros(dim),
            g: FeatureVector::zeros(dim),
        })
    }

    pub fn weight(&self) -> &FeatureVector {
        &self.w
    }

    /// Accumulated gradients.
    pub fn gradients(&self) -> &FeatureVector {
        &self.g
    }

    /// Accumulated squared gradients.
    pub fn squared_gradients(&self) -> &FeatureVector {
        &self.h
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    fn to_state(&self) -> AdagradRdaState {
        AdagradRdaState {
            w: self.w.clone(),
            h: self.h.clone(),
            g: self.g.clone(),
            dimension: self.dim,
            eta: self.eta,
            lambda: self.lambda,
            timestep: self.timestep,
        }
    }

    fn from_state(state: AdagradRdaState) -> Result<Self, ClassifierError> {
        let mut model = AdagradRda::new(state.dimension, state.eta, state.lambda)?;
        for found in [state.w.len(), state.h.len(), state.g.len()] {
            if found != state.dimension {
                return Err(ClassifierError::DimensionMismatch {
                    expected: state.dimension,
                    found,
                });
            }
        }
        model.w = state.w;
        model.h = state.h;
        model.g = state.g;
        model.timestep = state.timestep;
        Ok(model)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let state: AdagradRdaState = model_file::load_record(path, Self::NAME)?;
        Ok(Self::from_state(state)?)
    }
}

impl OnlineClassifier for AdagradRda {
    fn update(&mut self, feature: &FeatureVector, label: i32) -> bool {
        if hinge_loss(self.margin(feature), label) <= 0.0 {
            return false;
        }

        self.timestep += 1;
        let t = self.timestep as f64;
        let y = f64::from(label);

        for (((w, h), g), &x) in self
            .w
            .iter_mut()
            .zip(self.h.iter_mut())
            .zip(self.g.iter_mut())
            .zip(feature.iter())
        {
            let gradient = -y * x;
            *g += gradient;
            *h += gradient * gradient;

            let u = g.abs() / t;
            *w = if u <= self.lambda {
                0.0
            } else {
                let sign = if *g >= 0.0 { 1.0 } else { -1.0 };
                let eta = self.eta / h.sqrt();
                -sign * eta * t * (u - self.lambda)
            };
        }
        log::trace!("ADAGRAD_RDA update: timestep={}", self.timestep);
        true
    }

    fn margin(&self, feature: &FeatureVector) -> f64 {
        self.w.dot(feature)
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
