//! Reduction of per-query scores into one dataset-level score.

use serde::{Deserialize, Serialize};

/// How per-query scores are combined.
///
/// Every variant skips undefined (NaN) per-query scores. When no defined
/// score remains the result is NaN, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Unweighted arithmetic mean: every query counts the same.
    #[default]
    Mean,
    /// Mean weighted by each query's document count.
    DocumentWeighted,
    /// Square root of the mean of squared scores.
    ///
    /// For RMSE this reproduces the square root of the dataset-level MSE up to
    /// floating-point rounding, since `sqrt(m) * sqrt(m)` need not equal `m`
    /// exactly.
    RootMeanSquare,
}

impl Reduction {
    /// Reduce `scores`, where `sizes[i]` is the document count of query `i`.
    ///
    /// Scores are summed in the order given.
    pub fn reduce(&self, scores: &[f64], sizes: &[usize]) -> f64 {
        let defined = scores
            .iter()
            .zip(sizes.iter())
            .filter(|(s, _)| !s.is_nan());
        let (sum, weight): (f64, f64) = match self {
            Reduction::Mean => defined.fold((0.0, 0.0), |(sum, n), (s, _)| (sum + s, n + 1.0)),
            Reduction::DocumentWeighted => defined.fold((0.0, 0.0), |(sum, w), (s, &size)| {
                (sum + s * size as f64, w + size as f64)
            }),
            Reduction::RootMeanSquare => {
                defined.fold((0.0, 0.0), |(sum, n), (s, _)| (sum + s * s, n + 1.0))
            }
        };
        if weight == 0.0 {
            return f64::NAN;
        }
        let mean = sum / weight;
        match self {
            Reduction::RootMeanSquare => mean.sqrt(),
            _ => mean,
        }
    }
}
