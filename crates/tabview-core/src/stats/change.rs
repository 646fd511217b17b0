//! Period-over-period change for KPI comparison strips

use serde::{Deserialize, Serialize};

/// Changes beyond this many percent are flagged significant
pub const SIGNIFICANCE_THRESHOLD_PCT: f64 = 5.0;

/// Relative change of a metric against its baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Signed percentage, `((current - baseline) / baseline) * 100`
    pub percent: f64,
    pub significant: bool,
}

impl Change {
    pub fn is_increase(&self) -> bool {
        self.percent > 0.0
    }

    /// Unsigned percentage with one decimal, e.g. "12.5%"
    pub fn magnitude_display(&self) -> String {
        format!("{:.1}%", self.percent.abs())
    }
}

/// Percent change of `current` against `baseline`
///
/// `None` when the baseline is zero or either input is not finite.
pub fn percent_change(current: f64, baseline: f64) -> Option<Change> {
    if baseline == 0.0 || !baseline.is_finite() || !current.is_finite() {
        return None;
    }

    let percent = (current - baseline) / baseline * 100.0;
    Some(Change {
        percent,
        significant: percent.abs() > SIGNIFICANCE_THRESHOLD_PCT,
    })
}
