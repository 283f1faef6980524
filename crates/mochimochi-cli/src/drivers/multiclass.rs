use std::path::PathBuf;

use anyhow::{Context, Result};

use mochimochi_classifiers::config::MulticlassConfig;
use mochimochi_classifiers::io::LabeledExample;
use mochimochi_classifiers::{ClassifierError, MulticlassPA};

use super::{load_examples, write_predictions, Evaluation, Prediction};

#[derive(Debug, Clone)]
pub struct MulticlassRun {
    pub config: MulticlassConfig,
    /// Stored composer; replaces `config` entirely when set.
    pub load: Option<PathBuf>,
    pub train: Option<PathBuf>,
    pub test: PathBuf,
    pub save: Option<PathBuf>,
    pub shuffle: Option<u64>,
    pub predictions: Option<PathBuf>,
}

pub fn train(model: &mut MulticlassPA, examples: &[LabeledExample]) -> Result<usize> {
    let mut corrections = 0;
    for (idx, example) in examples.iter().enumerate() {
        let updated = usize::try_from(example.label)
            .map_err(|_| ClassifierError::InvalidLabel(example.label))
            .and_then(|label| model.update(&example.feature, label))
            .with_context(|| {
                format!(
                    "Training example {} needs a class index below {}",
                    idx + 1,
                    model.n_class()
                )
            })?;
        if updated {
            corrections += 1;
        }
    }
    log::debug!(
        "MPA applied {} corrections over {} examples",
        corrections,
        examples.len()
    );
    Ok(corrections)
}

pub fn evaluate(model: &MulticlassPA, examples: &[LabeledExample]) -> (Evaluation, Vec<Prediction>) {
    let mut evaluation = Evaluation::default();
    let mut predictions = Vec::with_capacity(examples.len());
    for example in examples {
        let scores = model.scores(&example.feature);
        let predicted = model.predict(&example.feature);
        evaluation.record(predicted as i64 == example.label);
        predictions.push(Prediction {
            label: example.label,
            predicted: predicted as i64,
            score: scores[predicted],
        });
    }
    (evaluation, predictions)
}

pub fn run_multiclass(run: &MulticlassRun) -> Result<Evaluation> {
    let mut model = match &run.load {
        Some(path) => {
            let model = MulticlassPA::from_file(path)?;
            log::info!(
                "Loaded MPA model ({} classes, dimension {}) from {}",
                model.n_class(),
                model.dim(),
                path.display()
            );
            model
        }
        None => MulticlassPA::from_config(&run.config)?,
    };

    if let Some(path) = &run.train {
        let examples = load_examples(path, model.dim(), run.shuffle)?;
        log::info!("Training MPA ...");
        train(&mut model, &examples)?;
    }

    if let Some(path) = &run.save {
        model.save(path)?;
        log::info!("Saved MPA model to {}", path.display());
    }

    let examples = load_examples(&run.test, model.dim(), None)?;
    log::info!("Predicting ...");
    let (evaluation, predictions) = evaluate(&model, &examples);
    if let Some(path) = &run.predictions {
        write_predictions(&predictions, path)?;
    }
    Ok(evaluation)
}
