use thiserror::Error;

/// Main error type for rankeval
#[derive(Error, Debug)]
pub enum RankevalError {
    /// Two vectors that must be aligned 1:1 have different lengths
    #[error("Shape mismatch in {context}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Metric or evaluation settings rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Query boundaries or labels that do not describe a valid partition
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Non-finite prediction under the reject policy
    #[error("Non-finite prediction {value} at document {index}")]
    NonFinite { index: usize, value: f64 },
}

impl RankevalError {
    pub(crate) fn shape(context: &'static str, expected: usize, actual: usize) -> Self {
        RankevalError::ShapeMismatch {
            context,
            expected,
            actual,
        }
    }
}

/// Convenient Result type using RankevalError
pub type Result<T> = std::result::Result<T, RankevalError>;
