//! Metric contract and the concrete metric variants.
//!
//! Every metric scores one query at a time through [`Metric::eval_per_query`];
//! grouping, validation and reduction across queries are shared and live in
//! [`crate::eval`]. A metric only chooses its [`Reduction`].

pub mod cutoff;
pub mod mse;
pub mod rmse;

pub use mse::Mse;
pub use rmse::Rmse;

use crate::dataset::QueryGroups;
use crate::error::{RankevalError, Result};
use crate::eval::{evaluate, EvalOptions, EvaluationReport, Reduction};
use std::fmt;

/// A ranking quality metric evaluated per query and reduced across queries.
///
/// Implementations are immutable configuration and may be shared across
/// threads and evaluations.
pub trait Metric: Send + Sync {
    /// Base display name, e.g. `"RMSE"`.
    fn name(&self) -> &str;

    /// Number of top-ranked documents considered per query, if truncating.
    fn cutoff(&self) -> Option<usize>;

    /// Score one query.
    ///
    /// `y[i]` and `y_pred[i]` describe the same document. Implementations apply
    /// cutoff truncation by predicted rank (see [`cutoff::select`]) and return
    /// NaN for a query with no documents.
    fn eval_per_query(&self, y: &[f64], y_pred: &[f64]) -> Result<f64>;

    /// How per-query scores are combined. Defaults to the unweighted mean.
    fn reduction(&self) -> Reduction {
        Reduction::Mean
    }

    /// `name`, or `name@cutoff` when a cutoff is configured.
    fn label(&self) -> String {
        format_label(self.name(), self.cutoff())
    }

    /// Dataset-level score with default options.
    fn eval(&self, dataset: &dyn QueryGroups, y_pred: &[f64]) -> Result<f64> {
        self.eval_with(dataset, y_pred, &EvalOptions::default())
    }

    fn eval_with(
        &self,
        dataset: &dyn QueryGroups,
        y_pred: &[f64],
        options: &EvalOptions,
    ) -> Result<f64> {
        Ok(evaluate(self, dataset, y_pred, options)?.value)
    }

    /// Dataset-level score together with every per-query score.
    fn eval_detailed(
        &self,
        dataset: &dyn QueryGroups,
        y_pred: &[f64],
        options: &EvalOptions,
    ) -> Result<EvaluationReport> {
        evaluate(self, dataset, y_pred, options)
    }
}

/// Display label for a metric name and optional cutoff.
pub fn format_label(name: &str, cutoff: Option<usize>) -> String {
    match cutoff {
        Some(k) => format!("{}@{}", name, k),
        None => name.to_string(),
    }
}

/// Reject a zero cutoff. `None` means no truncation.
pub fn validate_cutoff(cutoff: Option<usize>) -> Result<Option<usize>> {
    match cutoff {
        Some(0) => Err(RankevalError::InvalidConfiguration(
            "cutoff must be a positive integer".to_string(),
        )),
        other => Ok(other),
    }
}

pub(crate) fn check_aligned(y: &[f64], y_pred: &[f64]) -> Result<()> {
    if y.len() != y_pred.len() {
        return Err(RankevalError::shape("per-query predictions", y.len(), y_pred.len()));
    }
    Ok(())
}

/// The closed set of metrics that can be built from configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricKind {
    Mse(Mse),
    Rmse(Rmse),
}

impl MetricKind {
    /// Build a metric from its kind (`"mse"` or `"rmse"`, case-insensitive).
    pub fn build(kind: &str, name: Option<&str>, cutoff: Option<usize>) -> Result<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "mse" => Ok(MetricKind::Mse(Mse::with_name(
                name.unwrap_or(Mse::DEFAULT_NAME),
                cutoff,
            )?)),
            "rmse" => Ok(MetricKind::Rmse(Rmse::with_name(
                name.unwrap_or(Rmse::DEFAULT_NAME),
                cutoff,
            )?)),
            other => Err(RankevalError::InvalidConfiguration(format!(
                "unknown metric kind: {}",
                other
            ))),
        }
    }
}

impl Metric for MetricKind {
    fn name(&self) -> &str {
        match self {
            MetricKind::Mse(m) => m.name(),
            MetricKind::Rmse(m) => m.name(),
        }
    }

    fn cutoff(&self) -> Option<usize> {
        match self {
            MetricKind::Mse(m) => m.cutoff(),
            MetricKind::Rmse(m) => m.cutoff(),
        }
    }

    fn eval_per_query(&self, y: &[f64], y_pred: &[f64]) -> Result<f64> {
        match self {
            MetricKind::Mse(m) => m.eval_per_query(y, y_pred),
            MetricKind::Rmse(m) => m.eval_per_query(y, y_pred),
        }
    }

    fn reduction(&self) -> Reduction {
        match self {
            MetricKind::Mse(m) => m.reduction(),
            MetricKind::Rmse(m) => m.reduction(),
        }
    }
}

impl From<Mse> for MetricKind {
    fn from(m: Mse) -> Self {
        MetricKind::Mse(m)
    }
}

impl From<Rmse> for MetricKind {
    fn from(m: Rmse) -> Self {
        MetricKind::Rmse(m)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
