//! Stable single-field ordering
//!
//! Equal keys keep their input order, so pagination over a sorted set is
//! deterministic across calls. Records missing the sort field always go
//! last, whichever the direction.

use crate::models::Record;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Parse "asc"/"ascending"/"desc"/"descending" (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

/// Sort field and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Column-header click behaviour
    ///
    /// Clicking the current column flips its direction; clicking another
    /// column sorts by it ascending.
    pub fn toggle(&self, field: &str) -> Self {
        if self.field == field {
            Self {
                field: self.field.clone(),
                direction: self.direction.reversed(),
            }
        } else {
            Self::ascending(field)
        }
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match (a.get(&self.field), b.get(&self.field)) {
            (Some(x), Some(y)) => {
                let ord = x.total_cmp(y);
                match self.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Return `records` ordered by `spec`
///
/// `slice::sort_by` is a stable merge sort, which gives the tie-breaking
/// guarantee directly.
///
/// # Examples
///
/// ```
/// use tabview_core::models::Record;
/// use tabview_core::sort::{sort, SortSpec};
/// use std::sync::Arc;
///
/// let records = vec![
///     Arc::new(Record::new().with("a", "x").with("n", 3.0)),
///     Arc::new(Record::new().with("a", "y").with("n", 1.0)),
///     Arc::new(Record::new().with("a", "z").with("n", 3.0)),
/// ];
/// let sorted = sort(&records, &SortSpec::ascending("n"));
/// let order: Vec<_> = sorted.iter().map(|r| r.text("a").unwrap()).collect();
/// assert_eq!(order, vec!["y", "x", "z"]);
/// ```
pub fn sort(records: &[Arc<Record>], spec: &SortSpec) -> Vec<Arc<Record>> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| spec.compare(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ids(records: &[Arc<Record>]) -> Vec<&str> {
        records.iter().map(|r| r.text("id").unwrap()).collect()
    }

    #[test]
    fn test_descending_is_stable() {
        let records = vec![
            Arc::new(Record::new().with("id", "a").with("n", 1.0)),
            Arc::new(Record::new().with("id", "b").with("n", 2.0)),
            Arc::new(Record::new().with("id", "c").with("n", 1.0)),
            Arc::new(Record::new().with("id", "d").with("n", 2.0)),
        ];
        let sorted = sort(&records, &SortSpec::descending("n"));
        assert_eq!(ids(&sorted), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_missing_values_sort_last_both_directions() {
        let records = vec![
            Arc::new(Record::new().with("id", "none1")),
            Arc::new(Record::new().with("id", "low").with("cost", 1.0)),
            Arc::new(Record::new().with("id", "none2")),
            Arc::new(Record::new().with("id", "high").with("cost", 9.0)),
        ];

        let asc = sort(&records, &SortSpec::ascending("cost"));
        assert_eq!(ids(&asc), vec!["low", "high", "none1", "none2"]);

        let desc = sort(&records, &SortSpec::descending("cost"));
        assert_eq!(ids(&desc), vec!["high", "low", "none1", "none2"]);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let records = vec![
            Arc::new(Record::new().with("id", "ten").with("n", 10.0)),
            Arc::new(Record::new().with("id", "nine").with("n", 9.0)),
        ];
        let sorted = sort(&records, &SortSpec::ascending("n"));
        assert_eq!(ids(&sorted), vec!["nine", "ten"]);
    }

    #[test]
    fn test_timestamps_chronological() {
        let records = vec![
            Arc::new(
                Record::new()
                    .with("id", "later")
                    .with("ts", Utc.with_ymd_and_hms(2025, 1, 24, 0, 0, 0).unwrap()),
            ),
            Arc::new(
                Record::new()
                    .with("id", "earlier")
                    .with("ts", Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()),
            ),
        ];
        let sorted = sort(&records, &SortSpec::ascending("ts"));
        assert_eq!(ids(&sorted), vec!["earlier", "later"]);
    }

    #[test]
    fn test_unknown_field_keeps_input_order() {
        let records = vec![
            Arc::new(Record::new().with("id", "a")),
            Arc::new(Record::new().with("id", "b")),
        ];
        let sorted = sort(&records, &SortSpec::descending("missing"));
        assert_eq!(ids(&sorted), vec!["a", "b"]);
    }

    #[test]
    fn test_toggle() {
        let spec = SortSpec::ascending("volume");
        let flipped = spec.toggle("volume");
        assert_eq!(flipped, SortSpec::descending("volume"));
        assert_eq!(flipped.toggle("volume"), SortSpec::ascending("volume"));
        assert_eq!(flipped.toggle("cost"), SortSpec::ascending("cost"));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Descending));
        assert_eq!(SortDirection::parse("ascending"), Some(SortDirection::Ascending));
        assert_eq!(SortDirection::parse("up"), None);
    }
}
