//! Query-grouped datasets: the boundaries and ground-truth labels metrics are evaluated against.

use crate::error::{RankevalError, Result};
use std::collections::HashSet;
use std::ops::Range;

/// Read-only view of a dataset partitioned into query groups.
///
/// Documents of one query occupy the contiguous span
/// `query_offsets()[i]..query_offsets()[i + 1]`. Offsets start at 0, never
/// decrease and end at `n_instances()`.
pub trait QueryGroups: Sync {
    /// Total number of documents across all queries.
    fn n_instances(&self) -> usize;

    /// Query boundaries, `n_queries() + 1` entries.
    fn query_offsets(&self) -> &[usize];

    /// Ground-truth relevance label per document, aligned with document indices.
    fn labels(&self) -> &[f64];

    fn n_queries(&self) -> usize {
        self.query_offsets().len().saturating_sub(1)
    }

    /// Document span of query `i`, or `None` if `i >= n_queries()`.
    fn query_span(&self, i: usize) -> Option<Range<usize>> {
        let offsets = self.query_offsets();
        Some(*offsets.get(i)?..*offsets.get(i + 1)?)
    }

    /// Spans of every query, in dataset order.
    fn query_spans(&self) -> Vec<Range<usize>> {
        self.query_offsets()
            .windows(2)
            .map(|w| w[0]..w[1])
            .collect()
    }
}

/// Check that `offsets` partitions `0..n_instances` into contiguous spans.
pub fn validate_offsets(offsets: &[usize], n_instances: usize) -> Result<()> {
    match offsets.first() {
        None => {
            return Err(RankevalError::InvalidDataset(
                "query offsets are empty (need at least [0])".to_string(),
            ))
        }
        Some(&first) if first != 0 => {
            return Err(RankevalError::InvalidDataset(format!(
                "query offsets must start at 0, got {}",
                first
            )))
        }
        Some(_) => {}
    }
    if let Some(pos) = offsets.windows(2).position(|w| w[1] < w[0]) {
        return Err(RankevalError::InvalidDataset(format!(
            "query offsets decrease at query {} ({} -> {})",
            pos,
            offsets[pos],
            offsets[pos + 1]
        )));
    }
    let last = offsets[offsets.len() - 1];
    if last != n_instances {
        return Err(RankevalError::InvalidDataset(format!(
            "query offsets end at {} but dataset has {} documents",
            last, n_instances
        )));
    }
    Ok(())
}

/// In-memory dataset: labels plus query boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: Option<String>,
    labels: Vec<f64>,
    query_offsets: Vec<usize>,
    query_ids: Option<Vec<String>>,
}

impl Dataset {
    /// Build from labels and explicit offsets (`[0, ..., labels.len()]`).
    pub fn new(labels: Vec<f64>, query_offsets: Vec<usize>) -> Result<Self> {
        validate_offsets(&query_offsets, labels.len())?;
        Ok(Self {
            name: None,
            labels,
            query_offsets,
            query_ids: None,
        })
    }

    /// Build from labels and the number of documents in each query.
    pub fn from_query_lengths(labels: Vec<f64>, lengths: &[usize]) -> Result<Self> {
        let mut offsets = Vec::with_capacity(lengths.len() + 1);
        offsets.push(0);
        let mut end = 0usize;
        for &len in lengths {
            end += len;
            offsets.push(end);
        }
        Self::new(labels, offsets)
    }

    /// Build from labels and a per-document query id column.
    ///
    /// Consecutive documents sharing an id form one group. An id that shows up
    /// again after a different one is rejected: groups must be contiguous.
    pub fn from_query_ids<S: AsRef<str>>(labels: Vec<f64>, qids: &[S]) -> Result<Self> {
        if qids.len() != labels.len() {
            return Err(RankevalError::shape("query ids", labels.len(), qids.len()));
        }
        let mut offsets = vec![0];
        let mut ids: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (i, qid) in qids.iter().enumerate() {
            let qid = qid.as_ref();
            if ids.last().map(String::as_str) == Some(qid) {
                continue;
            }
            if !seen.insert(qid) {
                return Err(RankevalError::InvalidDataset(format!(
                    "query id {} is not contiguous (reappears at document {})",
                    qid, i
                )));
            }
            if i > 0 {
                offsets.push(i);
            }
            ids.push(qid.to_string());
        }
        if !labels.is_empty() {
            offsets.push(labels.len());
        }
        let mut dataset = Self::new(labels, offsets)?;
        dataset.query_ids = Some(ids);
        Ok(dataset)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Query ids, when the dataset was built from an id column.
    pub fn query_ids(&self) -> Option<&[String]> {
        self.query_ids.as_deref()
    }

    /// New dataset holding the given queries, in the given order.
    ///
    /// Each query keeps its internal document order. Query indices may repeat.
    pub fn subset(&self, queries: &[usize]) -> Result<Self> {
        let n_queries = self.n_queries();
        let mut labels = Vec::new();
        let mut offsets = vec![0];
        let mut ids = self.query_ids.as_ref().map(|_| Vec::with_capacity(queries.len()));
        for &q in queries {
            let span = self.query_span(q).ok_or_else(|| {
                RankevalError::InvalidDataset(format!(
                    "query index {} out of range ({} queries)",
                    q, n_queries
                ))
            })?;
            labels.extend_from_slice(&self.labels[span]);
            offsets.push(labels.len());
            if let (Some(out), Some(src)) = (ids.as_mut(), self.query_ids.as_ref()) {
                out.push(src[q].clone());
            }
        }
        Ok(Self {
            name: self.name.clone(),
            labels,
            query_offsets: offsets,
            query_ids: ids,
        })
    }

    /// Gather the per-document values of `values` in the layout of `subset(queries)`.
    ///
    /// Used to carry a prediction vector along with a re-ordered dataset.
    pub fn subset_values(&self, values: &[f64], queries: &[usize]) -> Result<Vec<f64>> {
        if values.len() != self.n_instances() {
            return Err(RankevalError::shape("values", self.n_instances(), values.len()));
        }
        let n_queries = self.n_queries();
        let mut out = Vec::new();
        for &q in queries {
            let span = self.query_span(q).ok_or_else(|| {
                RankevalError::InvalidDataset(format!(
                    "query index {} out of range ({} queries)",
                    q, n_queries
                ))
            })?;
            out.extend_from_slice(&values[span]);
        }
        Ok(out)
    }
}

impl QueryGroups for Dataset {
    fn n_instances(&self) -> usize {
        self.labels.len()
    }

    fn query_offsets(&self) -> &[usize] {
        &self.query_offsets
    }

    fn labels(&self) -> &[f64] {
        &self.labels
    }
}
