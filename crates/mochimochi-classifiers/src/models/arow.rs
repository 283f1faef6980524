use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, check_positive, ClassifierError};
use crate::io::model_file;
use crate::math::FeatureVector;
use crate::models::classifier_trait::OnlineClassifier;
use crate::models::utils::{confidence, hinge_loss};

/// Adaptive Regularization of Weight vectors with a diagonal covariance.
///
/// `r` is the regularization trade-off: smaller values adapt faster.
#[derive(Debug, Clone, PartialEq)]
pub struct Arow {
    dim: usize,
    r: f64,
    covariances: FeatureVector,
    means: FeatureVector,
}

#[derive(Serialize, Deserialize)]
struct ArowState {
    covariances: FeatureVector,
    means: FeatureVector,
    dimension: usize,
    r: f64,
}

impl Arow {
    pub const NAME: &'static str = "AROW";

    pub fn new(dim: usize, r: f64) -> Result<Self, ClassifierError> {
        check_dimension(dim)?;
        check_positive("r", r)?;
        Ok(Arow {
            dim,
            r,
            covariances: FeatureVector::ones(dim),
            means: FeatureVector::zeros(dim),
        })
    }

    pub fn means(&self) -> &FeatureVector {
        &self.means
    }

    pub fn covariances(&self) -> &FeatureVector {
        &self.covariances
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    fn to_state(&self) -> ArowState {
        ArowState {
            covariances: self.covariances.clone(),
            means: self.means.clone(),
            dimension: self.dim,
            r: self.r,
        }
    }

    fn from_state(state: ArowState) -> Result<Self, ClassifierError> {
        let mut model = Arow::new(state.dimension, state.r)?;
        for found in [state.covariances.len(), state.means.len()] {
            if found != state.dimension {
                return Err(ClassifierError::DimensionMismatch {
                    expected: state.dimension,
                    found,
                });
            }
        }
        model.covariances = state.covariances;
        model.means = state.means;
        Ok(model)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let state: ArowState = model_file::load_record(path, Self::NAME)?;
        Ok(Self::from_state(state)?)
    }
}

impl OnlineClassifier for Arow {
    fn update(&mut self, feature: &FeatureVector, label: i32) -> bool {
        let margin = self.margin(feature);
        let loss = hinge_loss(margin, label);
        if loss <= 0.0 {
            return false;
        }

        let confidence = confidence(&self.covariances, feature);
        let beta = 1.0 / (confidence + self.r);
        let alpha = loss * beta;
        let y = f64::from(label);

        for ((mean, cov), &x) in self
            .means
            .iter_mut()
            .zip(self.covariances.iter_mut())
            .zip(feature.iter())
        {
            let sx = *cov * x;
            *mean += alpha * y * sx;
            *cov -= beta * sx * sx;
        }
        log::trace!("AROW update: loss={} alpha={} beta={}", loss, alpha, beta);
        true
    }

    fn margin(&self, feature: &FeatureVector) -> f64 {
        self.means.dot(feature)
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
