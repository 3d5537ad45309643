//! Root mean squared error, composed from [`Mse`].

use crate::error::Result;
use crate::eval::Reduction;
use crate::metrics::{format_label, Metric, Mse};
use std::fmt;

/// Root mean squared error.
///
/// Holds an [`Mse`] with the same cutoff and takes the square root of its
/// per-query value; truncation and differencing happen only in `Mse`.
///
/// Per-query values are combined with [`Reduction::RootMeanSquare`], so the
/// dataset-level RMSE is the square root of the dataset-level MSE up to
/// rounding. The per-query value is exactly `sqrt` of the per-query MSE.
#[derive(Debug, Clone, PartialEq)]
pub struct Rmse {
    name: String,
    mse: Mse,
}

impl Rmse {
    pub const DEFAULT_NAME: &'static str = "RMSE";

    /// Create an RMSE metric. Fails if `cutoff` is `Some(0)`.
    pub fn new(cutoff: Option<usize>) -> Result<Self> {
        Self::with_name(Self::DEFAULT_NAME, cutoff)
    }

    pub fn with_name(name: impl Into<String>, cutoff: Option<usize>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            mse: Mse::new(cutoff)?,
        })
    }

    /// The underlying squared-error metric.
    pub fn mse(&self) -> &Mse {
        &self.mse
    }
}

impl Default for Rmse {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            mse: Mse::default(),
        }
    }
}

impl Metric for Rmse {
    fn name(&self) -> &str {
        &self.name
    }

    fn cutoff(&self) -> Option<usize> {
        self.mse.cutoff()
    }

    fn eval_per_query(&self, y: &[f64], y_pred: &[f64]) -> Result<f64> {
        Ok(self.mse.eval_per_query(y, y_pred)?.sqrt())
    }

    fn reduction(&self) -> Reduction {
        Reduction::RootMeanSquare
    }
}

impl fmt::Display for Rmse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_label(&self.name, self.cutoff()))
    }
}
