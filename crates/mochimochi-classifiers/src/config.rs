use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Central configuration for a binary learner.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub dim: usize,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported algorithms and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    PA {
        #[serde(rename = "C")]
        c: f64,
        select: i32,
    },
    AROW {
        r: f64,
    },
    NHERD {
        #[serde(rename = "C")]
        c: f64,
        diagonal: i32,
    },
    SCW {
        #[serde(rename = "C")]
        c: f64,
        eta: f64,
        select: i32,
    },
    AdagradRda {
        eta: f64,
        lambda: f64,
    },
    // braces keep the variant representable inside the flattened config map
    Adam {},
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::PA { c: 1.0, select: 2 }
    }
}

impl ModelType {
    /// Short lowercase name, as accepted by `from_str`.
    pub fn short_name(&self) -> &'static str {
        match self {
            ModelType::PA { .. } => "pa",
            ModelType::AROW { .. } => "arow",
            ModelType::NHERD { .. } => "nherd",
            ModelType::SCW { .. } => "scw",
            ModelType::AdagradRda { .. } => "adagrad-rda",
            ModelType::Adam {} => "adam",
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "pa" => Ok(ModelType::PA { c: 1.0, select: 0 }),
            "pa1" | "pa-i" => Ok(ModelType::PA { c: 1.0, select: 1 }),
            "pa2" | "pa-ii" => Ok(ModelType::PA { c: 1.0, select: 2 }),
            "arow" => Ok(ModelType::AROW { r: 0.1 }),
            "nherd" => Ok(ModelType::NHERD {
                c: 0.1,
                diagonal: 0,
            }),
            "scw" => Ok(ModelType::SCW {
                c: 1.0,
                eta: 0.95,
                select: 1,
            }),
            "adagrad-rda" | "adagrad" => Ok(ModelType::AdagradRda {
                eta: 0.1,
                lambda: 1e-6,
            }),
            "adam" => Ok(ModelType::Adam {}),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: pa, pa1, pa2, arow, nherd, scw, adagrad-rda, adam",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(dim: usize, model_type: ModelType) -> Self {
        Self { dim, model_type }
    }

    /// Read a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config: ModelConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
        Ok(config)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dim: 1,
            model_type: ModelType::default(),
        }
    }
}

/// Configuration of the multiclass Passive-Aggressive composer.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MulticlassConfig {
    pub dim: usize,
    pub n_class: usize,
    #[serde(rename = "C")]
    pub c: f64,
    pub select: i32,
}

impl Default for MulticlassConfig {
    fn default() -> Self {
        Self {
            dim: 1,
            n_class: 2,
            c: 0.5,
            select: 2,
        }
    }
}
