//! Dataset-level evaluation: split predictions per query, score each query, reduce.
//!
//! All metrics share this path. A metric contributes only its per-query scorer
//! and its [`Reduction`]; the grouping and validation below are never
//! re-implemented per metric.

pub mod reduction;

pub use reduction::Reduction;

use crate::dataset::{validate_offsets, QueryGroups};
use crate::error::{RankevalError, Result};
use crate::metrics::Metric;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// What to do with NaN or infinite predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonFinitePolicy {
    /// A query whose scored documents include a NaN or infinite prediction
    /// is undefined (NaN) and is left out of the reduction.
    #[default]
    Propagate,
    /// Fail the evaluation on the first non-finite prediction.
    Reject,
}

/// Options for one evaluation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalOptions {
    /// Score query groups on the rayon thread pool.
    ///
    /// Per-query scores are collected in dataset order and reduced
    /// sequentially, so the result is bit-identical to a sequential run.
    pub parallel: bool,
    pub non_finite: NonFinitePolicy,
}

/// Outcome of evaluating one metric on one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Metric label, e.g. `RMSE@10`.
    pub label: String,
    /// Aggregate score; NaN if no query produced a defined score.
    pub value: f64,
    /// Per-query scores in dataset order; NaN marks an undefined query.
    pub per_query: Vec<f64>,
    pub n_queries: usize,
    /// Queries with a defined score, i.e. those that took part in the reduction.
    pub n_defined: usize,
}

/// Label and aggregate score of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricScore {
    pub label: String,
    pub value: f64,
}

/// Validate `y_pred` against `dataset` and return the query spans.
fn check_inputs(
    dataset: &dyn QueryGroups,
    y_pred: &[f64],
    policy: NonFinitePolicy,
) -> Result<Vec<Range<usize>>> {
    let n = dataset.n_instances();
    validate_offsets(dataset.query_offsets(), n)?;
    if dataset.labels().len() != n {
        return Err(RankevalError::shape("ground truth", n, dataset.labels().len()));
    }
    if y_pred.len() != n {
        return Err(RankevalError::shape("predictions", n, y_pred.len()));
    }
    if policy == NonFinitePolicy::Reject {
        if let Some((index, &value)) = y_pred.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(RankevalError::NonFinite { index, value });
        }
    }
    Ok(dataset.query_spans())
}

/// Score every query of `dataset`, in dataset order.
///
/// Fails as a whole if any query fails; no partial results are returned.
pub fn per_query_scores<M: Metric + ?Sized>(
    metric: &M,
    dataset: &dyn QueryGroups,
    y_pred: &[f64],
    options: &EvalOptions,
) -> Result<Vec<f64>> {
    let spans = check_inputs(dataset, y_pred, options.non_finite)?;
    score_spans(metric, dataset.labels(), y_pred, &spans, options.parallel)
}

fn score_spans<M: Metric + ?Sized>(
    metric: &M,
    y: &[f64],
    y_pred: &[f64],
    spans: &[Range<usize>],
    parallel: bool,
) -> Result<Vec<f64>> {
    let score = |span: &Range<usize>| {
        metric.eval_per_query(&y[span.clone()], &y_pred[span.clone()])
    };
    if parallel {
        spans.par_iter().map(score).collect()
    } else {
        spans.iter().map(score).collect()
    }
}

/// Evaluate `metric` on `dataset` and reduce with the metric's [`Reduction`].
pub fn evaluate<M: Metric + ?Sized>(
    metric: &M,
    dataset: &dyn QueryGroups,
    y_pred: &[f64],
    options: &EvalOptions,
) -> Result<EvaluationReport> {
    let label = metric.label();
    let start = std::time::Instant::now();

    let spans = check_inputs(dataset, y_pred, options.non_finite)?;
    log::debug!(
        "{}: scoring {} queries ({} documents, parallel={})",
        label,
        spans.len(),
        y_pred.len(),
        options.parallel
    );
    let per_query = score_spans(metric, dataset.labels(), y_pred, &spans, options.parallel)?;

    let sizes: Vec<usize> = spans.iter().map(|s| s.len()).collect();
    let value = metric.reduction().reduce(&per_query, &sizes);
    let n_defined = per_query.iter().filter(|s| !s.is_nan()).count();
    if n_defined == 0 && !per_query.is_empty() {
        log::warn!("{}: all {} per-query scores are undefined", label, per_query.len());
    }
    log::debug!(
        "{}: {} of {} queries defined, value {} (took {:?})",
        label,
        n_defined,
        per_query.len(),
        value,
        start.elapsed()
    );

    Ok(EvaluationReport {
        label,
        value,
        n_queries: per_query.len(),
        n_defined,
        per_query,
    })
}

/// Evaluate several metrics on the same predictions, in the given order.
pub fn evaluate_all<M: Metric>(
    metrics: &[M],
    dataset: &dyn QueryGroups,
    y_pred: &[f64],
    options: &EvalOptions,
) -> Result<Vec<MetricScore>> {
    metrics
        .iter()
        .map(|metric| {
            let report = evaluate(metric, dataset, y_pred, options)?;
            Ok(MetricScore {
                label: report.label,
                value: report.value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::metrics::{MetricKind, Mse, Rmse};

    fn two_queries() -> (Dataset, Vec<f64>) {
        let ds = Dataset::new(vec![1.0, 0.0, 1.0, 0.0], vec![0, 2, 4]).unwrap();
        (ds, vec![1.0, 0.0, 0.0, 1.0])
    }

    /// Dataset with offsets that bypass `Dataset` validation.
    struct RawGroups {
        labels: Vec<f64>,
        offsets: Vec<usize>,
    }

    impl QueryGroups for RawGroups {
        fn n_instances(&self) -> usize {
            self.labels.len()
        }
        fn query_offsets(&self) -> &[usize] {
            &self.offsets
        }
        fn labels(&self) -> &[f64] {
            &self.labels
        }
    }

    #[test]
    fn mean_over_queries() {
        let (ds, preds) = two_queries();
        let report = evaluate(&Mse::default(), &ds, &preds, &EvalOptions::default()).unwrap();
        assert_eq!(report.per_query, vec![0.0, 1.0]);
        assert!((report.value - 0.5).abs() < 1e-12);
        assert_eq!(report.n_queries, 2);
        assert_eq!(report.n_defined, 2);
        assert_eq!(report.label, "MSE");
    }

    #[test]
    fn per_query_scores_in_dataset_order() {
        let (ds, preds) = two_queries();
        let scores =
            per_query_scores(&Rmse::default(), &ds, &preds, &EvalOptions::default()).unwrap();
        assert_eq!(scores, vec![0.0, 1.0]);
    }

    #[test]
    fn rmse_is_root_of_dataset_mse() {
        let (ds, preds) = two_queries();
        let rmse = Rmse::default().eval(&ds, &preds).unwrap();
        assert!((rmse - 0.7071067811865476).abs() < 1e-12);
    }

    #[test]
    fn empty_query_does_not_change_aggregate() {
        let (ds, preds) = two_queries();
        let with_empty = Dataset::new(ds.labels().to_vec(), vec![0, 2, 2, 4]).unwrap();
        let mse = Mse::default();
        let base = mse.eval(&ds, &preds).unwrap();
        let report = mse
            .eval_detailed(&with_empty, &preds, &EvalOptions::default())
            .unwrap();
        assert_eq!(base.to_bits(), report.value.to_bits());
        assert!(report.per_query[1].is_nan());
        assert_eq!(report.n_queries, 3);
        assert_eq!(report.n_defined, 2);
    }

    #[test]
    fn all_queries_undefined_gives_nan() {
        let ds = Dataset::new(vec![], vec![0, 0, 0]).unwrap();
        let report = evaluate(&Rmse::default(), &ds, &[], &EvalOptions::default()).unwrap();
        assert!(report.value.is_nan());
        assert_eq!(report.n_defined, 0);
    }

    #[test]
    fn no_queries_gives_nan() {
        let ds = Dataset::new(vec![], vec![0]).unwrap();
        assert!(Mse::default().eval(&ds, &[]).unwrap().is_nan());
    }

    #[test]
    fn prediction_length_mismatch_fails() {
        let (ds, _) = two_queries();
        let err = Mse::default().eval(&ds, &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            RankevalError::ShapeMismatch { expected: 4, actual: 3, .. }
        ));
    }

    #[test]
    fn corrupt_boundaries_fail() {
        let raw = RawGroups {
            labels: vec![1.0, 0.0, 1.0],
            offsets: vec![0, 2],
        };
        let err = Mse::default().eval(&raw, &[1.0, 0.0, 1.0]).unwrap_err();
        assert!(matches!(err, RankevalError::InvalidDataset(_)));

        let raw = RawGroups {
            labels: vec![1.0, 0.0, 1.0],
            offsets: vec![0, 3, 1, 3],
        };
        assert!(Mse::default().eval(&raw, &[1.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn non_finite_propagates_by_default() {
        let (ds, mut preds) = two_queries();
        preds[3] = f64::NAN;
        let report = evaluate(&Mse::default(), &ds, &preds, &EvalOptions::default()).unwrap();
        assert!(report.per_query[1].is_nan());
        assert_eq!(report.value, 0.0);
    }

    #[test]
    fn infinite_prediction_treated_like_nan() {
        let (ds, mut preds) = two_queries();
        preds[2] = f64::INFINITY;
        for metric in [MetricKind::from(Mse::default()), MetricKind::from(Rmse::default())] {
            let report = evaluate(&metric, &ds, &preds, &EvalOptions::default()).unwrap();
            assert!(report.per_query[1].is_nan());
            assert_eq!(report.n_defined, 1);
            assert_eq!(report.value, 0.0);
        }
    }

    #[test]
    fn non_finite_rejected_when_configured() {
        let (ds, mut preds) = two_queries();
        preds[2] = f64::INFINITY;
        let options = EvalOptions {
            non_finite: NonFinitePolicy::Reject,
            ..EvalOptions::default()
        };
        let err = evaluate(&Mse::default(), &ds, &preds, &options).unwrap_err();
        assert!(matches!(err, RankevalError::NonFinite { index: 2, .. }));
    }

    #[test]
    fn parallel_matches_sequential_bitwise() {
        let lengths: Vec<usize> = (0..64).map(|i| i % 7).collect();
        let n: usize = lengths.iter().sum();
        let labels: Vec<f64> = (0..n).map(|i| (i % 5) as f64).collect();
        let preds: Vec<f64> = (0..n).map(|i| ((i * 37) % 11) as f64 / 3.0).collect();
        let ds = Dataset::from_query_lengths(labels, &lengths).unwrap();
        let metric = Rmse::new(Some(3)).unwrap();

        let seq = evaluate(&metric, &ds, &preds, &EvalOptions::default()).unwrap();
        let par = evaluate(
            &metric,
            &ds,
            &preds,
            &EvalOptions {
                parallel: true,
                ..EvalOptions::default()
            },
        )
        .unwrap();
        assert_eq!(seq.value.to_bits(), par.value.to_bits());
        let seq_bits: Vec<u64> = seq.per_query.iter().map(|v| v.to_bits()).collect();
        let par_bits: Vec<u64> = par.per_query.iter().map(|v| v.to_bits()).collect();
        assert_eq!(seq_bits, par_bits);
    }

    #[test]
    fn parallel_failure_aborts() {
        let (ds, preds) = two_queries();
        let options = EvalOptions {
            parallel: true,
            ..EvalOptions::default()
        };
        assert!(evaluate(&Mse::default(), &ds, &preds[..3], &options).is_err());
    }

    #[test]
    fn query_order_does_not_change_aggregate() {
        let ds = Dataset::from_query_lengths(vec![1.0, 0.0, 2.0, 2.0, 1.0, 0.0], &[2, 1, 3])
            .unwrap();
        let preds = vec![0.5, 0.5, 1.0, 2.0, 0.0, 1.5];
        let order = [2, 0, 1];
        let permuted = ds.subset(&order).unwrap();
        let permuted_preds = ds.subset_values(&preds, &order).unwrap();
        let metric = Mse::default();
        let a = metric.eval(&ds, &preds).unwrap();
        let b = metric.eval(&permuted, &permuted_preds).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn document_weighted_reduction_override() {
        struct WeightedMse(Mse);
        impl Metric for WeightedMse {
            fn name(&self) -> &str {
                "WMSE"
            }
            fn cutoff(&self) -> Option<usize> {
                self.0.cutoff()
            }
            fn eval_per_query(&self, y: &[f64], y_pred: &[f64]) -> Result<f64> {
                self.0.eval_per_query(y, y_pred)
            }
            fn reduction(&self) -> Reduction {
                Reduction::DocumentWeighted
            }
        }

        // Query A: 1 doc, MSE 1. Query B: 3 docs, MSE 0.
        let ds = Dataset::from_query_lengths(vec![1.0, 0.0, 0.0, 0.0], &[1, 3]).unwrap();
        let preds = [0.0, 0.0, 0.0, 0.0];
        let weighted = WeightedMse(Mse::default()).eval(&ds, &preds).unwrap();
        let plain = Mse::default().eval(&ds, &preds).unwrap();
        assert!((weighted - 0.25).abs() < 1e-12);
        assert!((plain - 0.5).abs() < 1e-12);
    }

    #[test]
    fn evaluate_all_keeps_order_and_labels() {
        let (ds, preds) = two_queries();
        let metrics = vec![
            MetricKind::build("mse", None, None).unwrap(),
            MetricKind::build("rmse", None, Some(1)).unwrap(),
        ];
        let scores = evaluate_all(&metrics, &ds, &preds, &EvalOptions::default()).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].label, "MSE");
        assert_eq!(scores[1].label, "RMSE@1");
        // Top-1: query A doc 0 (err 0), query B doc 1 (err 1).
        assert!((scores[1].value - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn report_serializes_undefined_as_null() {
        let ds = Dataset::new(vec![1.0], vec![0, 0, 1]).unwrap();
        let report = evaluate(&Mse::default(), &ds, &[1.0], &EvalOptions::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["label"], "MSE");
        assert!(json["per_query"][0].is_null());
        assert_eq!(json["per_query"][1], 0.0);
        assert_eq!(json["n_defined"], 1);
    }
}
