//! Cell values held by a record

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single field value
///
/// Serialized untagged: numbers as JSON numbers, timestamps as RFC 3339
/// strings, everything else as plain strings. On deserialization a string
/// that parses as RFC 3339 becomes a `Timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl Value {
    /// Numeric view of the value; only finite numbers qualify
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Short type label used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Timestamp(_) => "timestamp",
            Value::Text(_) => "text",
        }
    }

    /// Rank used to order values of different kinds within one column:
    /// numbers, then timestamps, then text.
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::Timestamp(_) => 1,
            Value::Text(_) => 2,
        }
    }

    /// Total order over values
    ///
    /// Numbers compare numerically (`f64::total_cmp`), timestamps
    /// chronologically, text by byte-wise lexicographic order (locale
    /// invariant). Mixed kinds fall back to the kind rank.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.as_str().cmp(b.as_str()),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    /// Parse user input into the most specific value kind
    ///
    /// Tries a number first, then an RFC 3339 timestamp, and falls back to text.
    pub fn parse_lossy(input: &str) -> Value {
        let trimmed = input.trim();
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Value::Number(n);
            }
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
            return Value::Timestamp(ts.with_timezone(&Utc));
        }
        Value::Text(input.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}
