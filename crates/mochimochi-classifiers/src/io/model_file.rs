//! JSON model files.
//!
//! Every model is stored as an envelope
//! `{ "format_version": 1, "algorithm": "<NAME>", "state": { .. } }` whose
//! `state` carries the named fields of one learner. Writes go to a sibling
//! temporary file which is renamed over the target once fully synced.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current on-disk layout. Older or newer layouts are rejected.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    format_version: u32,
    algorithm: &'a str,
    state: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    format_version: u32,
    algorithm: String,
    state: T,
}

#[derive(Deserialize)]
struct Header {
    format_version: u32,
    algorithm: String,
}

/// Serialize `state` under the `algorithm` tag and atomically replace `path`.
///
/// Non-finite numbers have no JSON form, so a state holding one is refused
/// before anything touches the disk.
pub fn save_record<T: Serialize>(path: &Path, algorithm: &str, state: &T) -> Result<()> {
    let state = serde_json::to_value(state)
        .with_context(|| format!("Failed to encode {} model", algorithm))?;
    if has_null(&state) {
        bail!(
            "Refusing to save {} model to {}: state holds NaN or infinite values",
            algorithm,
            path.display()
        );
    }
    let tmp_path = temporary_sibling(path)?;

    let written = write_envelope(&tmp_path, algorithm, &state);
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| {
            format!(
                "Failed to move model file into place: {}",
                path.display()
            )
        });
    }

    log::debug!("Saved {} model to {}", algorithm, path.display());
    Ok(())
}

/// Read the record at `path`, checking format version and algorithm tag.
pub fn load_record<T: DeserializeOwned>(path: &Path, algorithm: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    let header: Header = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse model file: {}", path.display()))?;
    check_header(&header, path)?;
    if header.algorithm != algorithm {
        bail!(
            "Model file {} holds a {} model, expected {}",
            path.display(),
            header.algorithm,
            algorithm
        );
    }

    let envelope: Envelope<T> = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to decode {} model state: {}",
            algorithm,
            path.display()
        )
    })?;
    debug_assert_eq!(envelope.format_version, FORMAT_VERSION);
    debug_assert_eq!(envelope.algorithm, algorithm);

    log::debug!("Loaded {} model from {}", algorithm, path.display());
    Ok(envelope.state)
}

/// Algorithm tag of the model stored at `path`.
pub fn read_algorithm(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file: {}", path.display()))?;
    let header: Header = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse model file: {}", path.display()))?;
    check_header(&header, path)?;
    Ok(header.algorithm)
}

// serde_json encodes NaN and infinities as `null`; no state field is nullable.
fn has_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(has_null),
        Value::Object(fields) => fields.values().any(has_null),
        _ => false,
    }
}

fn check_header(header: &Header, path: &Path) -> Result<()> {
    if header.format_version != FORMAT_VERSION {
        bail!(
            "Unsupported model format version {} in {} (expected {})",
            header.format_version,
            path.display(),
            FORMAT_VERSION
        );
    }
    Ok(())
}

fn write_envelope<T: Serialize>(tmp_path: &Path, algorithm: &str, state: &T) -> Result<()> {
    let file = File::create(tmp_path)
        .with_context(|| format!("Failed to create model file: {}", tmp_path.display()))?;
    let mut writer = BufWriter::new(file);
    let envelope = EnvelopeRef {
        format_version: FORMAT_VERSION,
        algorithm,
        state,
    };
    serde_json::to_writer_pretty(&mut writer, &envelope)
        .with_context(|| format!("Failed to encode {} model", algorithm))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write model file: {}", tmp_path.display()))?;
    let file = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush model file {}: {}", tmp_path.display(), e))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync model file: {}", tmp_path.display()))?;
    Ok(())
}

fn temporary_sibling(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Model path has no file name: {}", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(format!(".tmp-{}", std::process::id()));
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Toy {
        weight: Vec<f64>,
        dimension: usize,
    }

    #[test]
    fn record_round_trips_exact_floats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        let toy = Toy {
            weight: vec![0.1 + 0.2, -1.0 / 3.0, f64::MIN_POSITIVE, 1e300],
            dimension: 4,
        };
        save_record(&path, "TOY", &toy).unwrap();

        let back: Toy = load_record(&path, "TOY").unwrap();
        assert_eq!(back, toy);
        for (a, b) in back.weight.iter().zip(toy.weight.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(read_algorithm(&path).unwrap(), "TOY");
    }

    #[test]
    fn wrong_algorithm_tag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        let toy = Toy {
            weight: vec![1.0],
            dimension: 1,
        };
        save_record(&path, "TOY", &toy).unwrap();
        let err = load_record::<Toy>(&path, "PA").unwrap_err();
        assert!(format!("{:#}", err).contains("expected PA"));
    }

    #[test]
    fn unknown_format_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        fs::write(
            &path,
            r#"{"format_version": 99, "algorithm": "TOY", "state": {"weight": [], "dimension": 0}}"#,
        )
        .unwrap();
        assert!(load_record::<Toy>(&path, "TOY").is_err());
        assert!(read_algorithm(&path).is_err());
    }

    #[test]
    fn missing_file_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_record::<Toy>(&dir.path().join("absent.json"), "TOY").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read model file"));
    }

    #[test]
    fn non_finite_state_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        let good = Toy {
            weight: vec![1.0, 2.0],
            dimension: 2,
        };
        save_record(&path, "TOY", &good).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let toy = Toy {
                weight: vec![bad, 0.0],
                dimension: 2,
            };
            let err = save_record(&path, "TOY", &toy).unwrap_err();
            assert!(err.to_string().contains("NaN or infinite"));
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn unwritable_target_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("toy.json");
        let toy = Toy {
            weight: vec![1.0],
            dimension: 1,
        };
        assert!(save_record(&path, "TOY", &toy).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
