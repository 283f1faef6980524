use std::error::Error;
use std::fmt;

/// Precondition violations raised while building or feeding a classifier.
///
/// Construction-time failures (`InvalidParameter`, `InvalidMode`) mean the
/// learner was never created. I/O failures are reported separately through
/// `anyhow::Error` by the persistence and reader functions.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    InvalidParameter { name: &'static str, reason: String },
    InvalidMode { name: &'static str, value: i64 },
    DimensionMismatch { expected: usize, found: usize },
    InvalidLabel(i64),
    UnknownAlgorithm(String),
}

impl ClassifierError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ClassifierError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassifierError::InvalidParameter { name, reason } => {
                write!(f, "Invalid hyper parameter '{}': {}", name, reason)
            }
            ClassifierError::InvalidMode { name, value } => {
                write!(f, "Invalid mode selector '{}' = {}", name, value)
            }
            ClassifierError::DimensionMismatch { expected, found } => write!(
                f,
                "Feature dimension mismatch: expected {}, found {}",
                expected, found
            ),
            ClassifierError::InvalidLabel(label) => write!(f, "Invalid label: {}", label),
            ClassifierError::UnknownAlgorithm(name) => write!(f, "Unknown algorithm: {}", name),
        }
    }
}

impl Error for ClassifierError {}

/// Validate `dim > 0`.
pub(crate) fn check_dimension(dim: usize) -> Result<(), ClassifierError> {
    if dim == 0 {
        return Err(ClassifierError::invalid("dimension", "must be > 0"));
    }
    Ok(())
}

/// Validate a finite, strictly positive hyper parameter.
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), ClassifierError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ClassifierError::invalid(
            name,
            format!("must be finite and > 0, got {}", value),
        ));
    }
    Ok(())
}
