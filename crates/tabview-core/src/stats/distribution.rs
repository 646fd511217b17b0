//! Percentile rank, five-number summaries and histograms

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Upper bound on histogram buckets, to keep a tiny width from allocating
/// millions of empty buckets
const MAX_BUCKETS: usize = 1_000;

/// Percentage (0 to 100) of `distribution` values less than or equal to `value`
///
/// Non-finite entries in `distribution` are ignored.
///
/// # Errors
/// `EmptyDistribution` when `distribution` has no finite values.
///
/// # Examples
///
/// ```
/// use tabview_core::stats::percentile_rank;
///
/// assert_eq!(percentile_rank(7.0, &[7.0]).unwrap(), 100.0);
/// assert_eq!(percentile_rank(2.0, &[1.0, 2.0, 3.0, 4.0]).unwrap(), 50.0);
/// assert!(percentile_rank(1.0, &[]).is_err());
/// ```
pub fn percentile_rank(value: f64, distribution: &[f64]) -> Result<f64> {
    let mut total = 0usize;
    let mut at_or_below = 0usize;
    for v in distribution.iter().filter(|v| v.is_finite()) {
        total += 1;
        if *v <= value {
            at_or_below += 1;
        }
    }

    if total == 0 {
        return Err(CoreError::EmptyDistribution);
    }

    Ok(at_or_below as f64 / total as f64 * 100.0)
}

/// Box-plot statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

impl FiveNumberSummary {
    /// Compute from raw values; `None` when there are no finite values
    ///
    /// Quartiles interpolate linearly between closest ranks, i.e. the
    /// p-quantile sits at position `p * (n - 1)` of the sorted values.
    pub fn compute(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            min: sorted[0],
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            count: sorted.len(),
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Values outside the 1.5 × IQR whiskers
    pub fn outliers(&self, values: &[f64]) -> Vec<f64> {
        let low = self.q1 - 1.5 * self.iqr();
        let high = self.q3 + 1.5 * self.iqr();
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && (*v < low || *v > high))
            .collect()
    }
}

fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// One histogram bar covering `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    /// Share of all counted values, 0 to 100
    pub percentage: f64,
}

/// Bucket `values` into contiguous bins of `bucket_width`
///
/// Bins are aligned to multiples of `bucket_width` and run from the bin
/// holding the smallest value to the bin holding the largest, empty bins
/// included. Non-finite values are skipped; no finite values gives an empty
/// histogram.
///
/// # Errors
/// `InvalidBucketWidth` for a non-positive or non-finite width, or one so
/// small the value range would need more than 1000 bins.
pub fn histogram(values: &[f64], bucket_width: f64) -> Result<Vec<HistogramBucket>> {
    if !(bucket_width.is_finite() && bucket_width > 0.0) {
        return Err(CoreError::InvalidBucketWidth {
            width: bucket_width,
        });
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(min) = finite.iter().copied().reduce(f64::min) else {
        return Ok(Vec::new());
    };
    let max = finite.iter().copied().fold(min, f64::max);

    let first_bin = (min / bucket_width).floor();
    let last_bin = (max / bucket_width).floor();
    let span = last_bin - first_bin + 1.0;
    if !span.is_finite() || span > MAX_BUCKETS as f64 {
        return Err(CoreError::InvalidBucketWidth {
            width: bucket_width,
        });
    }

    let bins = span as usize;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = ((v / bucket_width).floor() - first_bin) as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    let total = finite.len() as f64;
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = (first_bin + i as f64) * bucket_width;
            HistogramBucket {
                lower,
                upper: lower + bucket_width,
                count,
                percentage: count as f64 / total * 100.0,
            }
        })
        .collect())
}
