use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{check_dimension, check_positive, ClassifierError};
use crate::io::model_file;
use crate::math::FeatureVector;
use crate::models::classifier_trait::OnlineClassifier;
use crate::models::utils::{confidence, hinge_loss};

/// Diagonal approximation used for the NHERD covariance update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagonalMode {
    /// diagonal 0
    Full,
    /// diagonal 1
    Exact,
    /// diagonal 2
    Project,
    /// diagonal 3
    Drop,
}

impl DiagonalMode {
    pub fn from_diagonal(diagonal: i32) -> Result<Self, ClassifierError> {
        match diagonal {
            0 => Ok(DiagonalMode::Full),
            1 => Ok(DiagonalMode::Exact),
            2 => Ok(DiagonalMode::Project),
            3 => Ok(DiagonalMode::Drop),
            other => Err(ClassifierError::InvalidMode {
                name: "diagonal",
                value: i64::from(other),
            }),
        }
    }

    pub fn diagonal(self) -> i32 {
        match self {
            DiagonalMode::Full => 0,
            DiagonalMode::Exact => 1,
            DiagonalMode::Project => 2,
            DiagonalMode::Drop => 3,
        }
    }

    /// New covariance entry from the prior entry, the example confidence
    /// and the feature value. Never larger than `covariance`.
    pub fn contract(self, covariance: f64, confidence: f64, value: f64, c: f64) -> f64 {
        let next = match self {
            // on a diagonal store the full-matrix rule keeps only its
            // diagonal, which coincides with the drop rule
            DiagonalMode::Full | DiagonalMode::Drop => {
                let v = covariance * value;
                let denom = 1.0 + c * confidence;
                covariance - v * v * (c * c * confidence + 2.0 * c) / (denom * denom)
            }
            DiagonalMode::Exact => {
                let denom = 1.0 + c * value * value * covariance;
                covariance / (denom * denom)
            }
            DiagonalMode::Project => {
                1.0 / (1.0 / covariance + (2.0 * c + c * c * confidence) * value * value)
            }
        };
        // rounding in the reciprocal forms can land one ulp above the prior
        next.min(covariance)
    }
}

/// Normal Herding classifier with a diagonal covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct Nherd {
    dim: usize,
    c: f64,
    mode: DiagonalMode,
    covariances: FeatureVector,
    means: FeatureVector,
}

#[derive(Serialize, Deserialize)]
struct NherdState {
    covariances: FeatureVector,
    means: FeatureVector,
    dimension: usize,
    #[serde(rename = "C")]
    c: f64,
    diagonal: i32,
}

impl Nherd {
    pub const NAME: &'static str = "NHERD";

    pub fn new(dim: usize, c: f64, diagonal: i32) -> Result<Self, ClassifierError> {
        check_dimension(dim)?;
        check_positive("C", c)?;
        let mode = DiagonalMode::from_diagonal(diagonal)?;
        Ok(Nherd {
            dim,
            c,
            mode,
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

    pub fn mode(&self) -> DiagonalMode {
        self.mode
    }

    fn to_state(&self) -> NherdState {
        NherdState {
            covariances: self.covariances.clone(),
            means: self.means.clone(),
            dimension: self.dim,
            c: self.c,
            diagonal: self.mode.diagonal(),
        }
    }

    fn from_state(state: NherdState) -> Result<Self, ClassifierError> {
        let mut model = Nherd::new(state.dimension, state.c, state.diagonal)?;
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
        let state: NherdState = model_file::load_record(path, Self::NAME)?;
        Ok(Self::from_state(state)?)
    }
}

impl OnlineClassifier for Nherd {
    fn update(&mut self, feature: &FeatureVector, label: i32) -> bool {
        let margin = self.margin(feature);
        if margin * f64::from(label) >= 1.0 {
            return false;
        }

        let confidence = confidence(&self.covariances, feature);
        let alpha = hinge_loss(margin, label) / (confidence + 1.0 / self.c);
        let y = f64::from(label);

        for ((mean, cov), &x) in self
            .means
            .iter_mut()
            .zip(self.covariances.iter_mut())
            .zip(feature.iter())
        {
            *mean += alpha * y * *cov * x;
            *cov = self.mode.contract(*cov, confidence, x, self.c);
        }
        log::trace!("NHERD update: margin={} alpha={}", margin, alpha);
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

    const MODES: [DiagonalMode; 4] = [
        DiagonalMode::Full,
        DiagonalMode::Exact,
        DiagonalMode::Project,
        DiagonalMode::Drop,
    ];

    #[test]
    fn invalid_diagonal_is_rejected() {
        assert_eq!(
            Nherd::new(2, 0.1, 4).unwrap_err(),
            ClassifierError::InvalidMode {
                name: "diagonal",
                value: 4
            }
        );
        assert!(Nherd::new(2, 0.1, -1).is_err());
        assert!(Nherd::new(2, 0.0, 0).is_err());
    }

    #[test]
    fn contraction_is_monotone_and_positive() {
        let values = [-3.0, -0.5, 0.0, 0.25, 1.0, 7.0];
        let covs = [1.0, 0.5, 1e-3];
        for mode in MODES {
            for &cov in &covs {
                for &x in &values {
                    // confidence always includes this feature's own term
                    let confidence = cov * x * x + 0.75;
                    let next = mode.contract(cov, confidence, x, 0.5);
                    assert!(next <= cov, "{:?} grew {} -> {}", mode, cov, next);
                    assert!(next > 0.0, "{:?} went non-positive", mode);
                }
            }
        }
    }

    #[test]
    fn zero_feature_keeps_covariance() {
        for mode in MODES {
            let next = mode.contract(0.3, 2.0, 0.0, 1.0);
            assert!((next - 0.3).abs() < 1e-15, "{:?} moved to {}", mode, next);
        }
    }

    #[test]
    fn learns_a_separable_direction() {
        for diagonal in 0..4 {
            let mut nherd = Nherd::new(2, 0.5, diagonal).unwrap();
            let pos = FeatureVector::from_vec(vec![1.0, 0.2]);
            let neg = FeatureVector::from_vec(vec![-1.0, 0.1]);
            for _ in 0..10 {
                nherd.update(&pos, 1);
                nherd.update(&neg, -1);
            }
            assert_eq!(nherd.predict(&pos), 1);
            assert_eq!(nherd.predict(&neg), -1);
        }
    }
}
