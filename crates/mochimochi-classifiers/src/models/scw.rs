use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{check_dimension, check_positive, ClassifierError};
use crate::io::model_file;
use crate::math::FeatureVector;
use crate::models::classifier_trait::OnlineClassifier;
use crate::models::utils::confidence;

/// SCW-I (select 1) clips the step at `C`; SCW-II (select 2) softens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScwMode {
    ScwI,
    ScwII,
}

impl ScwMode {
    pub fn from_select(select: i32) -> Result<Self, ClassifierError> {
        match select {
            1 => Ok(ScwMode::ScwI),
            2 => Ok(ScwMode::ScwII),
            other => Err(ClassifierError::InvalidMode {
                name: "select",
                value: i64::from(other),
            }),
        }
    }

    pub fn select(self) -> i32 {
        match self {
            ScwMode::ScwI => 1,
            ScwMode::ScwII => 2,
        }
    }
}

/// Soft Confidence-Weighted classifier with a diagonal covariance.
///
/// `eta` is the required probability of a correct prediction and must lie in
/// `(0.5, 1)`; `phi` is its standard-normal quantile.
#[derive(Debug, Clone, PartialEq)]
pub struct Scw {
    dim: usize,
    c: f64,
    eta: f64,
    mode: ScwMode,
    phi: f64,
    psi: f64,
    zeta: f64,
    covariances: FeatureVector,
    means: FeatureVector,
}

#[derive(Serialize, Deserialize)]
struct ScwState {
    covariances: FeatureVector,
    means: FeatureVector,
    dimension: usize,
    #[serde(rename = "C")]
    c: f64,
    eta: f64,
    select: i32,
}

impl Scw {
    pub const NAME: &'static str = "SCW";

    pub fn new(dim: usize, c: f64, eta: f64, select: i32) -> Result<Self, ClassifierError> {
        check_dimension(dim)?;
        check_positive("C", c)?;
        if !(eta > 0.5 && eta < 1.0) {
            return Err(ClassifierError::invalid(
                "eta",
                format!("must lie in (0.5, 1), got {}", eta),
            ));
        }
        let mode = ScwMode::from_select(select)?;

        let normal =
            Normal::new(0.0, 1.0).map_err(|e| ClassifierError::invalid("eta", e.to_string()))?;
        let phi = normal.inverse_cdf(eta);
        let phi2 = phi * phi;

        Ok(Scw {
            dim,
            c,
            eta,
            mode,
            phi,
            psi: 1.0 + phi2 / 2.0,
            zeta: 1.0 + phi2,
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

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn mode(&self) -> ScwMode {
        self.mode
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Step size for a signed margin `m = label * margin` and confidence `v`.
    fn alpha(&self, m: f64, v: f64) -> f64 {
        let phi = self.phi;
        let phi2 = phi * phi;
        match self.mode {
            ScwMode::ScwI => {
                let numer = -m * self.psi + (m * m * phi2 * phi2 / 4.0 + v * phi2 * self.zeta).sqrt();
                (numer / (v * self.zeta)).max(0.0).min(self.c)
            }
            ScwMode::ScwII => {
                let n = v + 1.0 / (2.0 * self.c);
                let gamma = phi * (phi2 * m * m * v * v + 4.0 * n * v * (n + v * phi2)).sqrt();
                let numer = -(2.0 * m * n + phi2 * m * v) + gamma;
                (numer / (2.0 * (n * n + n * v * phi2))).max(0.0)
            }
        }
    }

    fn to_state(&self) -> ScwState {
        ScwState {
            covariances: self.covariances.clone(),
            means: self.means.clone(),
            dimension: self.dim,
            c: self.c,
            eta: self.eta,
            select: self.mode.select(),
        }
    }

    fn from_state(state: ScwState) -> Result<Self, ClassifierError> {
        let mut model = Scw::new(state.dimension, state.c, state.eta, state.select)?;
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
        let state: ScwState = model_file::load_record(path, Self::NAME)?;
        Ok(Self::from_state(state)?)
    }
}

impl OnlineClassifier for Scw {
    fn update(&mut self, feature: &FeatureVector, label: i32) -> bool {
        let y = f64::from(label);
        let m = y * self.margin(feature);
        let v = confidence(&self.covariances, feature);

        let loss = self.phi * v.sqrt() - m;
        if loss <= 0.0 {
            return false;
        }

        let alpha = self.alpha(m, v);
        if alpha <= 0.0 {
            return false;
        }

        let avp = alpha * v * self.phi;
        let root = (avp * avp + 4.0 * v).sqrt() - avp;
        let u = root * root / 4.0;
        let beta = alpha * self.phi / (u.sqrt() + avp);

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
        log::trace!("SCW update: loss={} alpha={} beta={}", loss, alpha, beta);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_must_be_a_useful_probability() {
        assert!(Scw::new(2, 1.0, 0.5, 1).is_err());
        assert!(Scw::new(2, 1.0, 1.0, 1).is_err());
        assert!(Scw::new(2, 1.0, 0.3, 2).is_err());
        assert!(Scw::new(2, 1.0, 0.9, 3).is_err());
        let scw = Scw::new(2, 1.0, 0.95, 1).unwrap();
        assert!((scw.phi() - 1.6448536).abs() < 1e-6);
    }

    #[test]
    fn zero_feature_is_a_no_op() {
        let mut scw = Scw::new(3, 1.0, 0.9, 1).unwrap();
        let before = scw.clone();
        assert!(!scw.update(&FeatureVector::zeros(3), 1));
        assert_eq!(scw, before);
    }

    #[test]
    fn both_variants_separate_simple_data() {
        for select in [1, 2] {
            let mut scw = Scw::new(2, 1.0, 0.9, select).unwrap();
            let pos = FeatureVector::from_vec(vec![1.0, 0.5]);
            let neg = FeatureVector::from_vec(vec![-0.5, -1.0]);
            for _ in 0..5 {
                scw.update(&pos, 1);
                scw.update(&neg, -1);
            }
            assert_eq!(scw.predict(&pos), 1);
            assert_eq!(scw.predict(&neg), -1);
            for cov in scw.covariances().iter() {
                assert!(*cov > 0.0 && *cov <= 1.0);
            }
        }
    }

    #[test]
    fn scw_i_step_is_clipped_at_c() {
        let scw = Scw::new(1, 0.01, 0.9, 1).unwrap();
        assert!(scw.alpha(-5.0, 1.0) <= 0.01);
    }
}
