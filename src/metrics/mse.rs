//! Mean squared error between ground-truth labels and predicted scores.

use crate::error::Result;
use crate::metrics::{check_aligned, cutoff, format_label, validate_cutoff, Metric};
use std::fmt;

/// Mean squared error, optionally over the top-`cutoff` documents by prediction.
///
/// A query whose selected documents include a NaN or infinite prediction
/// scores NaN (undefined).
#[derive(Debug, Clone, PartialEq)]
pub struct Mse {
    name: String,
    cutoff: Option<usize>,
}

impl Mse {
    pub const DEFAULT_NAME: &'static str = "MSE";

    /// Create an MSE metric. Fails if `cutoff` is `Some(0)`.
    pub fn new(cutoff: Option<usize>) -> Result<Self> {
        Self::with_name(Self::DEFAULT_NAME, cutoff)
    }

    pub fn with_name(name: impl Into<String>, cutoff: Option<usize>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            cutoff: validate_cutoff(cutoff)?,
        })
    }
}

impl Default for Mse {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            cutoff: None,
        }
    }
}

impl Metric for Mse {
    fn name(&self) -> &str {
        &self.name
    }

    fn cutoff(&self) -> Option<usize> {
        self.cutoff
    }

    fn eval_per_query(&self, y: &[f64], y_pred: &[f64]) -> Result<f64> {
        check_aligned(y, y_pred)?;
        let selected = cutoff::select(y_pred, self.cutoff);
        if selected.is_empty() {
            return Ok(f64::NAN);
        }
        let mut sum = 0.0;
        for &i in &selected {
            // NaN and infinite predictions both leave the query undefined.
            if !y_pred[i].is_finite() {
                return Ok(f64::NAN);
            }
            let diff = y[i] - y_pred[i];
            sum += diff * diff;
        }
        Ok(sum / selected.len() as f64)
    }
}

impl fmt::Display for Mse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_label(&self.name, self.cutoff))
    }
}
