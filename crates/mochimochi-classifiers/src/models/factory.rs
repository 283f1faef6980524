use std::path::Path;

use anyhow::Result;

use crate::config::{ModelConfig, ModelType};
use crate::error::ClassifierError;
use crate::io::{model_file, svmlight};
use crate::math::FeatureVector;
use crate::models::adagrad_rda::AdagradRda;
use crate::models::adam::Adam;
use crate::models::arow::Arow;
use crate::models::classifier_trait::OnlineClassifier;
use crate::models::nherd::Nherd;
use crate::models::pa::PassiveAggressive;
use crate::models::scw::Scw;
use crate::models::utils::check_binary_label;

/// One of the binary learners, selected at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryModel {
    PA(PassiveAggressive),
    AROW(Arow),
    NHERD(Nherd),
    SCW(Scw),
    AdagradRda(AdagradRda),
    Adam(Adam),
}

macro_rules! dispatch {
    ($model:expr, $inner:ident => $body:expr) => {
        match $model {
            BinaryModel::PA($inner) => $body,
            BinaryModel::AROW($inner) => $body,
            BinaryModel::NHERD($inner) => $body,
            BinaryModel::SCW($inner) => $body,
            BinaryModel::AdagradRda($inner) => $body,
            BinaryModel::Adam($inner) => $body,
        }
    };
}

/// Build a binary learner from a `ModelConfig`.
pub fn build_model(config: &ModelConfig) -> Result<BinaryModel, ClassifierError> {
    let dim = config.dim;
    let model = match config.model_type {
        ModelType::PA { c, select } => BinaryModel::PA(PassiveAggressive::new(dim, c, select)?),
        ModelType::AROW { r } => BinaryModel::AROW(Arow::new(dim, r)?),
        ModelType::NHERD { c, diagonal } => BinaryModel::NHERD(Nherd::new(dim, c, diagonal)?),
        ModelType::SCW { c, eta, select } => BinaryModel::SCW(Scw::new(dim, c, eta, select)?),
        ModelType::AdagradRda { eta, lambda } => {
            BinaryModel::AdagradRda(AdagradRda::new(dim, eta, lambda)?)
        }
        ModelType::Adam {} => BinaryModel::Adam(Adam::new(dim)?),
    };
    log::debug!("Built {} model with dimension {}", model.name(), dim);
    Ok(model)
}

/// Restore whichever learner the model file at `path` describes.
pub fn load_model(path: &Path) -> Result<BinaryModel> {
    let algorithm = model_file::read_algorithm(path)?;
    let model = match algorithm.as_str() {
        PassiveAggressive::NAME => BinaryModel::PA(PassiveAggressive::from_file(path)?),
        Arow::NAME => BinaryModel::AROW(Arow::from_file(path)?),
        Nherd::NAME => BinaryModel::NHERD(Nherd::from_file(path)?),
        Scw::NAME => BinaryModel::SCW(Scw::from_file(path)?),
        AdagradRda::NAME => BinaryModel::AdagradRda(AdagradRda::from_file(path)?),
        Adam::NAME => BinaryModel::Adam(Adam::from_file(path)?),
        _ => return Err(ClassifierError::UnknownAlgorithm(algorithm).into()),
    };
    Ok(model)
}

impl BinaryModel {
    /// Configuration that rebuilds this learner's hyper parameters.
    pub fn config(&self) -> ModelConfig {
        let model_type = match self {
            BinaryModel::PA(m) => ModelType::PA {
                c: m.c(),
                select: m.mode().select(),
            },
            BinaryModel::AROW(m) => ModelType::AROW { r: m.r() },
            BinaryModel::NHERD(m) => ModelType::NHERD {
                c: m.c(),
                diagonal: m.mode().diagonal(),
            },
            BinaryModel::SCW(m) => ModelType::SCW {
                c: m.c(),
                eta: m.eta(),
                select: m.mode().select(),
            },
            BinaryModel::AdagradRda(m) => ModelType::AdagradRda {
                eta: m.eta(),
                lambda: m.lambda(),
            },
            BinaryModel::Adam(_) => ModelType::Adam {},
        };
        ModelConfig::new(self.dim(), model_type)
    }

    /// Parse one `label idx:value ...` line and learn from it.
    pub fn train_line(&mut self, line: &str) -> Result<bool> {
        let (label, feature) = svmlight::parse_line(line, self.dim())?;
        let label = check_binary_label(label)?;
        Ok(self.update(&feature, label))
    }

    /// `train_line` followed by a save of the updated model.
    pub fn train_line_and_save(&mut self, line: &str, path: &Path) -> Result<bool> {
        let updated = self.train_line(line)?;
        self.save(path)?;
        Ok(updated)
    }

    /// Parse one line and predict its label. The line's own label is ignored.
    pub fn infer_line(&self, line: &str) -> Result<i32> {
        let (_, feature) = svmlight::parse_line(line, self.dim())?;
        Ok(self.predict(&feature))
    }
}

impl OnlineClassifier for BinaryModel {
    fn update(&mut self, feature: &FeatureVector, label: i32) -> bool {
        dispatch!(self, m => m.update(feature, label))
    }

    fn margin(&self, feature: &FeatureVector) -> f64 {
        dispatch!(self, m => m.margin(feature))
    }

    fn predict(&self, feature: &FeatureVector) -> i32 {
        dispatch!(self, m => m.predict(feature))
    }

    fn save(&self, path: &Path) -> Result<()> {
        dispatch!(self, m => m.save(path))
    }

    /// Replace this learner with the model stored at `path`, whichever
    /// algorithm it holds.
    fn load(&mut self, path: &Path) -> Result<()> {
        *self = load_model(path)?;
        Ok(())
    }

    fn name(&self) -> &str {
        dispatch!(self, m => m.name())
    }

    fn dim(&self) -> usize {
        dispatch!(self, m => m.dim())
    }
}
