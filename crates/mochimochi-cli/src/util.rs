use anyhow::Result;
use std::path::Path;

/// Output tables must be `.tsv` or `.csv`.
pub fn validate_tsv_or_csv_path(path: &Path) -> Result<()> {
    match extension(path).as_deref() {
        Some("tsv") | Some("csv") => Ok(()),
        _ => anyhow::bail!(
            "File must have a .tsv or .csv extension: {}",
            path.display()
        ),
    }
}

/// Field delimiter implied by the file extension; anything but `.tsv` is comma separated.
pub fn delimiter_for(path: &Path) -> u8 {
    match extension(path).as_deref() {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}
