//! Train/test drivers: feed an example file through a learner, then score a
//! held-out file and report accuracy.
pub mod binary;
pub mod evaluation;
pub mod multiclass;
pub mod output;

use std::path::Path;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use mochimochi_classifiers::io::{read_examples, LabeledExample};

use crate::util::validate_input_file;

pub use evaluation::Evaluation;
pub use output::{write_predictions, Prediction};

/// Read every example of `path`, optionally shuffled with a fixed seed.
pub fn load_examples(path: &Path, dim: usize, shuffle: Option<u64>) -> Result<Vec<LabeledExample>> {
    validate_input_file(path)?;
    let mut examples = read_examples(path, dim)?;
    if let Some(seed) = shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        examples.shuffle(&mut rng);
        log::debug!("Shuffled {} examples with seed {}", examples.len(), seed);
    }
    log::info!("Read {} examples from {}", examples.len(), path.display());
    Ok(examples)
}
