//! Statistics over record sets
//!
//! Every function here is a pure function of its input. Results that cannot
//! be computed from the data (no numeric values, zero variance, fewer than two
//! pairs) come back as `None`, never as NaN, so the presentation layer can
//! render a placeholder instead of a misleading number.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::Record;

pub mod change;
pub mod correlation;
pub mod distribution;


pub use change::{percent_change, Change};
pub use correlation::{correlation, correlation_report, CorrelationReport, CorrelationStrength};
pub use distribution::{histogram, percentile_rank, FiveNumberSummary, HistogramBucket};

/// Aggregate operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggOp {
    Sum,
    Mean,
    Min,
    Max,
}

impl AggOp {
    pub const ALL: [AggOp; 4] = [AggOp::Sum, AggOp::Mean, AggOp::Min, AggOp::Max];

    pub fn name(&self) -> &'static str {
        match self {
            AggOp::Sum => "sum",
            AggOp::Mean => "mean",
            AggOp::Min => "min",
            AggOp::Max => "max",
        }
    }
}

/// Finite numeric values of `field`, skipping records where it is missing or
/// not a number
pub fn numeric_values<'a>(
    records: &'a [Arc<Record>],
    field: &'a str,
) -> impl Iterator<Item = f64> + 'a {
    records.iter().filter_map(move |r| r.number(field))
}

/// Sum, mean, min or max of `field`
///
/// `None` when no record holds a numeric value for `field`, including the
/// empty input.
pub fn aggregate(records: &[Arc<Record>], field: &str, op: AggOp) -> Option<f64> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for value in numeric_values(records, field) {
        count += 1;
        sum += value;
        min = min.min(value);
        max = max.max(value);
    }

    if count == 0 {
        return None;
    }

    let result = match op {
        AggOp::Sum => sum,
        AggOp::Mean => sum / count as f64,
        AggOp::Min => min,
        AggOp::Max => max,
    };
    // Sums of huge values can overflow to infinity
    result.is_finite().then_some(result)
}

/// Named metrics with an explicit "undefined" state
///
/// Serializes as a JSON object whose undefined metrics are `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    metrics: BTreeMap<String, Option<f64>>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.metrics.insert(name.into(), value);
    }

    /// Value of `name`; `None` when undefined or never computed
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// KPI-card summary of one numeric field: count, sum, mean, min, max
pub fn summarize(records: &[Arc<Record>], field: &str) -> AggregateResult {
    let mut result = AggregateResult::new();
    result.insert(
        "count",
        Some(numeric_values(records, field).count() as f64),
    );
    for op in AggOp::ALL {
        result.insert(op.name(), aggregate(records, field, op));
    }
    result
}
