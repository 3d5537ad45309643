pub mod config;
pub mod error;
pub mod dataset;
pub mod metrics;
pub mod eval;
pub mod logging;

pub use config::Config;
pub use error::{RankevalError, Result};
pub use dataset::{Dataset, QueryGroups};
pub use metrics::{format_label, Metric, MetricKind, Mse, Rmse};
pub use eval::{
    evaluate, evaluate_all, per_query_scores, EvalOptions, EvaluationReport, MetricScore,
    NonFinitePolicy, Reduction,
};
