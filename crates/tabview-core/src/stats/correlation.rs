//! Pearson correlation between two numeric fields

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::Record;

/// Pearson correlation coefficient of `field_x` against `field_y`
///
/// Computed over the records holding numeric values for both fields, from
/// sums centered on the means: `Σ(x−x̄)(y−ȳ) / sqrt(Σ(x−x̄)² · Σ(y−ȳ)²)`.
/// Centering keeps large offsets (epoch seconds, ids) from cancelling out
/// the spread.
///
/// # Returns
/// - `None` with fewer than 2 valid pairs
/// - `None` when either field has zero variance (every value identical)
/// - the coefficient, clamped to [-1, 1], otherwise
pub fn correlation(records: &[Arc<Record>], field_x: &str, field_y: &str) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| Some((r.number(field_x)?, r.number(field_y)?)))
        .collect();

    if pairs.len() < 2 {
        tracing::debug!(
            field_x,
            field_y,
            pairs = pairs.len(),
            "Correlation undefined: fewer than 2 numeric pairs"
        );
        return None;
    }

    // Exact check: the mean of a constant like 0.1 is not exactly 0.1, so
    // centered sums alone would leave a residue instead of zero.
    if is_constant(pairs.iter().map(|p| p.0)) || is_constant(pairs.iter().map(|p| p.1)) {
        tracing::debug!(field_x, field_y, "Correlation undefined: zero variance");
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denominator = sxx.sqrt() * syy.sqrt();
    if !(denominator.is_finite() && denominator > 0.0) {
        tracing::debug!(field_x, field_y, "Correlation undefined: zero variance");
        return None;
    }

    let coefficient = sxy / denominator;
    coefficient.is_finite().then(|| coefficient.clamp(-1.0, 1.0))
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Qualitative strength of a correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl CorrelationStrength {
    /// Classify by absolute coefficient: 0.8 / 0.6 / 0.4 / 0.2 cut points
    pub fn classify(coefficient: f64) -> Self {
        let abs = coefficient.abs();
        if abs >= 0.8 {
            Self::VeryStrong
        } else if abs >= 0.6 {
            Self::Strong
        } else if abs >= 0.4 {
            Self::Moderate
        } else if abs >= 0.2 {
            Self::Weak
        } else {
            Self::VeryWeak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryWeak => "Very Weak",
            Self::Weak => "Weak",
            Self::Moderate => "Moderate",
            Self::Strong => "Strong",
            Self::VeryStrong => "Very Strong",
        }
    }
}

/// Coefficient plus the derived figures a scatter-plot panel shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub coefficient: f64,
    /// Coefficient of determination (share of variance explained)
    pub r_squared: f64,
    pub strength: CorrelationStrength,
    pub positive: bool,
}

impl CorrelationReport {
    pub fn from_coefficient(coefficient: f64) -> Self {
        Self {
            coefficient,
            r_squared: coefficient * coefficient,
            strength: CorrelationStrength::classify(coefficient),
            positive: coefficient >= 0.0,
        }
    }

    /// e.g. "Strong Negative"
    pub fn describe(&self) -> String {
        format!(
            "{} {}",
            self.strength.label(),
            if self.positive { "Positive" } else { "Negative" }
        )
    }
}

/// `correlation` wrapped in a report; `None` whenever the coefficient is undefined
pub fn correlation_report(
    records: &[Arc<Record>],
    field_x: &str,
    field_y: &str,
) -> Option<CorrelationReport> {
    correlation(records, field_x, field_y).map(CorrelationReport::from_coefficient)
}
