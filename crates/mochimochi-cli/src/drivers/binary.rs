use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use mochimochi_classifiers::config::{ModelConfig, ModelType};
use mochimochi_classifiers::io::LabeledExample;
use mochimochi_classifiers::models::utils::check_binary_label;
use mochimochi_classifiers::models::{build_model, load_model, BinaryModel, OnlineClassifier};

use super::{load_examples, write_predictions, Evaluation, Prediction};

/// Everything a binary train/test run needs.
#[derive(Debug, Clone, Default)]
pub struct BinaryRun {
    /// Learner to build. Ignored when `load` is set.
    pub model: Option<ModelConfig>,
    pub load: Option<PathBuf>,
    pub train: Option<PathBuf>,
    pub test: PathBuf,
    pub save: Option<PathBuf>,
    pub shuffle: Option<u64>,
    pub predictions: Option<PathBuf>,
}

/// Interpret `model` as a JSON config file (`*.json`) or an algorithm name.
///
/// `dim` overrides the dimension of a config file and is mandatory for a name.
pub fn resolve_model_config(model: &str, dim: Option<usize>) -> Result<ModelConfig> {
    let path = Path::new(model);
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let mut config = ModelConfig::from_json_file(path)?;
        if let Some(dim) = dim {
            config.dim = dim;
        }
        return Ok(config);
    }

    let model_type = ModelType::from_str(model).map_err(anyhow::Error::msg)?;
    let dim = dim.ok_or_else(|| anyhow!("--dim is required when the model is given by name"))?;
    Ok(ModelConfig::new(dim, model_type))
}

/// Feed every example to the learner. Returns the number of corrections.
pub fn train(model: &mut BinaryModel, examples: &[LabeledExample]) -> Result<usize> {
    let mut corrections = 0;
    for (idx, example) in examples.iter().enumerate() {
        let label = check_binary_label(example.label)
            .with_context(|| format!("Training example {} needs a -1/+1 label", idx + 1))?;
        if model.update(&example.feature, label) {
            corrections += 1;
        }
    }
    log::debug!(
        "{} applied {} corrections over {} examples",
        model.name(),
        corrections,
        examples.len()
    );
    Ok(corrections)
}

/// Predict every example and compare against its label.
pub fn evaluate(model: &BinaryModel, examples: &[LabeledExample]) -> (Evaluation, Vec<Prediction>) {
    let mut evaluation = Evaluation::default();
    let mut predictions = Vec::with_capacity(examples.len());
    for example in examples {
        let score = model.margin(&example.feature);
        let predicted = i64::from(model.predict(&example.feature));
        evaluation.record(predicted == example.label);
        predictions.push(Prediction {
            label: example.label,
            predicted,
            score,
        });
    }
    (evaluation, predictions)
}

pub fn run_binary(run: &BinaryRun) -> Result<Evaluation> {
    let mut model = match (&run.load, &run.model) {
        (Some(path), _) => {
            let model = load_model(path)?;
            log::info!(
                "Loaded {} model (dimension {}) from {}",
                model.name(),
                model.dim(),
                path.display()
            );
            model
        }
        (None, Some(config)) => build_model(config)?,
        (None, None) => anyhow::bail!("Either a model or a model file to load is required"),
    };

    if let Some(path) = &run.train {
        let examples = load_examples(path, model.dim(), run.shuffle)?;
        log::info!("Training {} ...", model.name());
        train(&mut model, &examples)?;
    }

    if let Some(path) = &run.save {
        model.save(path)?;
        log::info!("Saved {} model to {}", model.name(), path.display());
    }

    let examples = load_examples(&run.test, model.dim(), None)?;
    log::info!("Predicting ...");
    let (evaluation, predictions) = evaluate(&model, &examples);
    if let Some(path) = &run.predictions {
        write_predictions(&predictions, path)?;
    }
    Ok(evaluation)
}
