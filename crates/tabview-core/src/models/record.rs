//! Flat key/value analytics rows

use super::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One analytics row: field name to value
///
/// A field that is absent from the map is "missing"; there is no null value.
/// Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    ///
    /// ```
    /// use tabview_core::models::Record;
    ///
    /// let record = Record::new().with("product", "kinetic").with("volume", 420.0);
    /// assert_eq!(record.number("volume"), Some(420.0));
    /// ```
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Finite numeric value of `field`, if any
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_number)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(Value::as_timestamp)
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field() {
        let record = Record::new().with("product", "anzenn");
        assert!(record.get("cost").is_none());
        assert_eq!(record.number("cost"), None);
        assert!(!record.contains_field("cost"));
    }

    #[test]
    fn test_typed_accessors_reject_other_kinds() {
        let record = Record::new().with("accuracy", "97.5");
        assert_eq!(record.text("accuracy"), Some("97.5"));
        assert_eq!(record.number("accuracy"), None);
    }

    #[test]
    fn test_from_json_object() {
        let record: Record =
            serde_json::from_str(r#"{"product":"riskguru","volume":812,"timestamp":"2025-01-22T11:20:00Z"}"#)
                .unwrap();
        assert_eq!(record.text("product"), Some("riskguru"));
        assert_eq!(record.number("volume"), Some(812.0));
        assert!(record.timestamp("timestamp").is_some());
        assert_eq!(record.len(), 3);
    }
}
