//! Cutoff truncation: selecting the documents a metric looks at within one query.

use std::cmp::Ordering;

/// Descending order on predicted scores. NaN sorts after every number.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Document indices of one query ranked by predicted score, highest first.
///
/// Ties keep original document order (stable sort), so the ranking is
/// reproducible for identical inputs.
pub fn rank_by_prediction(y_pred: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..y_pred.len()).collect();
    idx.sort_by(|&a, &b| descending(y_pred[a], y_pred[b]));
    idx
}

/// Indices of the documents considered under `cutoff`.
///
/// With no cutoff, or a cutoff at least the query size, every document is
/// returned in storage order. Otherwise the top `cutoff` documents by
/// predicted score are returned in rank order.
pub fn select(y_pred: &[f64], cutoff: Option<usize>) -> Vec<usize> {
    match cutoff {
        Some(k) if k < y_pred.len() => {
            let mut ranked = rank_by_prediction(y_pred);
            ranked.truncate(k);
            ranked
        }
        _ => (0..y_pred.len()).collect(),
    }
}
