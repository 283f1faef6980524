use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, ClassifierError};
use crate::io::model_file;
use crate::math::FeatureVector;
use crate::models::classifier_trait::OnlineClassifier;
use crate::models::utils::hinge_loss;

const ALPHA: f64 = 0.001;
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;
/// Per-step decay applied to `BETA1`.
const BETA1_DECAY: f64 = 0.99999999;

/// Adam on the hinge loss. Examples with zero loss are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    dim: usize,
    timestep: u64,
    w: FeatureVector,
    m: FeatureVector,
    v: FeatureVector,
}

#[derive(Serialize, Deserialize)]
struct AdamState {
    w: FeatureVector,
    m: FeatureVector,
    v: FeatureVector,
    dimension: usize,
    timestep: u64,
}

impl Adam {
    pub const NAME: &'static str = "ADAM";

    pub fn new(dim: usize) -> Result<Self, ClassifierError> {
        check_dimension(dim)?;
        Ok(Adam {
            dim,
            timestep: 0,
            w: FeatureVector::zeros(dim),
            m: FeatureVector::zeros(dim),
            v: FeatureVector::zeros(dim),
        })
    }

    pub fn weight(&self) -> &FeatureVector {
        &self.w
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    fn to_state(&self) -> AdamState {
        AdamState {
            w: self.w.clone(),
            m: self.m.clone(),
            v: self.v.clone(),
            dimension: self.dim,
            timestep: self.timestep,
        }
    }

    fn from_state(state: AdamState) -> Result<Self, ClassifierError> {
        let mut model = Adam::new(state.dimension)?;
        for found in [state.w.len(), state.m.len(), state.v.len()] {
            if found != state.dimension {
                return Err(ClassifierError::DimensionMismatch {
                    expected: state.dimension,
                    found,
                });
            }
        }
        model.w = state.w;
        model.m = state.m;
        model.v = state.v;
        model.timestep = state.timestep;
        Ok(model)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let state: AdamState = model_file::load_record(path, Self::NAME)?;
        Ok(Self::from_state(state)?)
    }
}

impl OnlineClassifier for Adam {
    fn update(&mut self, feature: &FeatureVector, label: i32) -> bool {
        if hinge_loss(self.margin(feature), label) <= 0.0 {
            return false;
        }

        // decayed before the step counter advances
        let beta1_t = BETA1_DECAY.powf(self.timestep as f64) * BETA1;
        self.timestep += 1;
        let t = self.timestep as f64;
        let m_correction = 1.0 - BETA1.powf(t);
        let v_correction = 1.0 - BETA2.powf(t);
        let y = f64::from(label);

        for (((w, m), v), &x) in self
            .w
            .iter_mut()
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
            .zip(feature.iter())
        {
            let gradient = -y * x;
            *m = beta1_t * *m + (1.0 - beta1_t) * gradient;
            *v = BETA2 * *v + (1.0 - BETA2) * gradient * gradient;
            let m_hat = *m / m_correction;
            let v_hat = *v / v_correction;
            *w -= ALPHA * m_hat / (v_hat.sqrt() + EPSILON);
        }
        log::trace!("ADAM update: timestep={} beta1_t={}", self.timestep, beta1_t);
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
