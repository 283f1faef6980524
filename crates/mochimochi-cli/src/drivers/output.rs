use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};

use crate::util::{delimiter_for, validate_tsv_or_csv_path};

/// One scored test example.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: i64,
    pub predicted: i64,
    /// Raw margin for binary learners, the winning class score for multiclass.
    pub score: f64,
}

/// Write predictions as CSV or TSV, depending on the file extension.
pub fn write_predictions<P: AsRef<Path>>(predictions: &[Prediction], output_path: P) -> Result<()> {
    let path = output_path.as_ref();
    validate_tsv_or_csv_path(path)?;

    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_for(path))
        .from_writer(BufWriter::new(file));

    writer.write_record(["index", "label", "predicted", "score"])?;
    for (idx, p) in predictions.iter().enumerate() {
        writer.write_record(&[
            (idx + 1).to_string(),
            p.label.to_string(),
            p.predicted.to_string(),
            p.score.to_string(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write predictions: {}", path.display()))?;
    log::info!("Wrote {} predictions to {}", predictions.len(), path.display());
    Ok(())
}
