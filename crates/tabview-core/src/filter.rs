//! Predicate-based record filtering
//!
//! Filtering never reorders: the output is always a subsequence of the input
//! in arrival order. Predicates combine with AND; an empty list is the
//! identity. Output rows are the same `Arc`s as the input.

use crate::error::{CoreError, Result};
use crate::models::{Record, Schema, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact value equality
    Equals,
    /// Case-insensitive substring match on text
    Contains,
    /// Value >= operand (numbers or timestamps)
    GreaterOrEqual,
    /// Value <= operand (numbers or timestamps)
    LessOrEqual,
    /// Value is one of a set
    InSet,
}

impl FilterOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOp::Equals => "=",
            FilterOp::Contains => "~",
            FilterOp::GreaterOrEqual => ">=",
            FilterOp::LessOrEqual => "<=",
            FilterOp::InSet => "in",
        }
    }
}

/// Right-hand side of a predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Set(Vec<Value>),
    Value(Value),
}

/// A single (field, operator, operand) condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    pub op: FilterOp,
    pub operand: Operand,
}

impl FilterPredicate {
    pub fn new(field: impl Into<String>, op: FilterOp, operand: Operand) -> Self {
        Self {
            field: field.into(),
            op,
            operand,
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Equals, Operand::Value(value.into()))
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(
            field,
            FilterOp::Contains,
            Operand::Value(Value::Text(needle.into())),
        )
    }

    pub fn at_least(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::GreaterOrEqual, Operand::Value(value.into()))
    }

    pub fn at_most(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::LessOrEqual, Operand::Value(value.into()))
    }

    pub fn in_set<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(
            field,
            FilterOp::InSet,
            Operand::Set(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Check the operand shape against the operator and pre-compute matchers
    fn compile(&self) -> Result<Compiled<'_>> {
        let invalid = |reason: String| CoreError::invalid_predicate(&self.field, reason);

        match (self.op, &self.operand) {
            (FilterOp::Equals, Operand::Value(v)) => Ok(Compiled::Equals(v)),
            (FilterOp::Contains, Operand::Value(Value::Text(needle))) => {
                Ok(Compiled::Contains(needle.to_lowercase()))
            }
            (FilterOp::Contains, Operand::Value(other)) => Err(invalid(format!(
                "contains requires a text operand, got {}",
                other.kind()
            ))),
            (FilterOp::GreaterOrEqual | FilterOp::LessOrEqual, Operand::Value(v)) => match v {
                Value::Number(n) if n.is_nan() => {
                    Err(invalid("threshold operand must not be NaN".to_string()))
                }
                Value::Number(_) | Value::Timestamp(_) => Ok(if self.op == FilterOp::GreaterOrEqual {
                    Compiled::AtLeast(v)
                } else {
                    Compiled::AtMost(v)
                }),
                Value::Text(_) => Err(invalid(format!(
                    "{} requires a numeric or timestamp operand, got text",
                    self.op.symbol()
                ))),
            },
            (FilterOp::InSet, Operand::Set(values)) => Ok(Compiled::InSet(values)),
            (FilterOp::InSet, Operand::Value(_)) => {
                Err(invalid("in requires a set of values".to_string()))
            }
            (op, Operand::Set(_)) => Err(invalid(format!(
                "{} requires a single value, got a set",
                op.symbol()
            ))),
        }
    }
}

enum Compiled<'a> {
    Equals(&'a Value),
    Contains(String),
    AtLeast(&'a Value),
    AtMost(&'a Value),
    InSet(&'a [Value]),
}

impl Compiled<'_> {
    /// Absent field values never match
    fn matches(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match self {
            Compiled::Equals(expected) => value_eq(value, expected),
            Compiled::Contains(needle) => value
                .as_text()
                .map(|s| s.to_lowercase().contains(needle.as_str()))
                .unwrap_or(false),
            Compiled::AtLeast(bound) => same_kind(value, bound) && value.total_cmp(bound).is_ge(),
            Compiled::AtMost(bound) => same_kind(value, bound) && value.total_cmp(bound).is_le(),
            Compiled::InSet(allowed) => allowed.iter().any(|a| value_eq(value, a)),
        }
    }
}

/// Thresholds only compare numbers with numbers and timestamps with timestamps
fn same_kind(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => !x.is_nan() && !y.is_nan(),
        (Value::Timestamp(_), Value::Timestamp(_)) => true,
        _ => false,
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => a == b,
    }
}

/// Free-text search across fields
///
/// Matches when the term occurs, case-insensitively, in the display text of
/// any listed field (all fields when `fields` is empty). An empty term
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub term: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            fields: Vec::new(),
        }
    }

    pub fn in_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty()
    }

    fn matches(&self, record: &Record, needle: &str) -> bool {
        let hit = |value: &Value| value.to_string().to_lowercase().contains(needle);
        if self.fields.is_empty() {
            record.iter().any(|(_, v)| hit(v))
        } else {
            self.fields
                .iter()
                .filter_map(|f| record.get(f))
                .any(hit)
        }
    }
}

/// Keep the records that satisfy every predicate
///
/// Operand shapes are checked up front; a bad predicate fails the whole call
/// with `InvalidPredicate` naming its field, even when `records` is empty.
///
/// # Examples
///
/// ```
/// use tabview_core::filter::{filter, FilterPredicate};
/// use tabview_core::models::Record;
/// use std::sync::Arc;
///
/// let records = vec![
///     Arc::new(Record::new().with("p", "wrapportal")),
///     Arc::new(Record::new().with("p", "kinetic")),
/// ];
/// let kept = filter(&records, &[FilterPredicate::equals("p", "kinetic")]).unwrap();
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].text("p"), Some("kinetic"));
/// ```
pub fn filter(records: &[Arc<Record>], predicates: &[FilterPredicate]) -> Result<Vec<Arc<Record>>> {
    filter_with_search(records, predicates, None)
}

/// `filter` plus an optional free-text search, all combined with AND
pub fn filter_with_search(
    records: &[Arc<Record>],
    predicates: &[FilterPredicate],
    search: Option<&SearchQuery>,
) -> Result<Vec<Arc<Record>>> {
    let compiled = predicates
        .iter()
        .map(|p| Ok((p.field.as_str(), p.compile()?)))
        .collect::<Result<Vec<_>>>()?;

    let search = search.filter(|s| !s.is_empty());
    let needle = search.map(|s| s.term.trim().to_lowercase());

    if compiled.is_empty() && search.is_none() {
        return Ok(records.to_vec());
    }

    Ok(records
        .iter()
        .filter(|record| {
            compiled
                .iter()
                .all(|(field, matcher)| matcher.matches(record.get(field)))
        })
        .filter(|record| match (search, needle.as_deref()) {
            (Some(query), Some(needle)) => query.matches(record, needle),
            _ => true,
        })
        .cloned()
        .collect())
}

/// Check predicates against a schema
///
/// Rejects unknown fields, fields marked not filterable, and operators that
/// do not fit the field type (`contains` on numbers, thresholds on text,
/// operands of the wrong kind). An empty schema accepts everything.
pub fn validate_predicates(schema: &Schema, predicates: &[FilterPredicate]) -> Result<()> {
    if schema.is_empty() {
        return Ok(());
    }

    for predicate in predicates {
        let field = schema
            .get(&predicate.field)
            .ok_or_else(|| CoreError::invalid_predicate(&predicate.field, "unknown field"))?;

        if !field.filterable {
            return Err(CoreError::invalid_predicate(
                &field.name,
                "field is not filterable",
            ));
        }

        let type_ok = match predicate.op {
            FilterOp::Contains => field.field_type.is_textual(),
            FilterOp::GreaterOrEqual | FilterOp::LessOrEqual => field.field_type.is_ordered(),
            FilterOp::Equals | FilterOp::InSet => true,
        };
        if !type_ok {
            return Err(CoreError::invalid_predicate(
                &field.name,
                format!(
                    "operator {} does not apply to {:?} fields",
                    predicate.op.symbol(),
                    field.field_type
                ),
            ));
        }

        let operands: &[Value] = match &predicate.operand {
            Operand::Value(v) => std::slice::from_ref(v),
            Operand::Set(values) => values,
        };
        if let Some(bad) = operands.iter().find(|v| !field.field_type.accepts(v)) {
            return Err(CoreError::invalid_predicate(
                &field.name,
                format!(
                    "operand of kind {} does not match {:?} field",
                    bad.kind(),
                    field.field_type
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldDescriptor;
    use chrono::{TimeZone, Utc};

    fn rows() -> Vec<Arc<Record>> {
        vec![
            Arc::new(
                Record::new()
                    .with("product", "WrapPortal")
                    .with("status", "success")
                    .with("volume", 500.0),
            ),
            Arc::new(
                Record::new()
                    .with("product", "kinetic")
                    .with("status", "warning")
                    .with("volume", 150.0),
            ),
            Arc::new(Record::new().with("product", "asureify").with("status", "error")),
            Arc::new(
                Record::new()
                    .with("product", "riskguru")
                    .with("status", "success")
                    .with("volume", 900.0),
            ),
        ]
    }

    fn products(records: &[Arc<Record>]) -> Vec<&str> {
        records.iter().map(|r| r.text("product").unwrap()).collect()
    }

    #[test]
    fn test_empty_predicates_is_identity() {
        let input = rows();
        let out = filter(&input, &[]).unwrap();
        assert_eq!(out.len(), input.len());
        for (a, b) in input.iter().zip(&out) {
            assert!(Arc::ptr_eq(a, b));
        }
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let out = filter(&rows(), &[FilterPredicate::contains("product", "portal")]).unwrap();
        assert_eq!(products(&out), vec!["WrapPortal"]);

        let out = filter(&rows(), &[FilterPredicate::contains("product", "KIN")]).unwrap();
        assert_eq!(products(&out), vec!["kinetic"]);
    }

    #[test]
    fn test_contains_rejects_numeric_operand() {
        let predicate = FilterPredicate::new(
            "volume",
            FilterOp::Contains,
            Operand::Value(Value::Number(5.0)),
        );
        let err = filter(&rows(), &[predicate]).unwrap_err();
        assert_eq!(err.field(), Some("volume"));
    }

    #[test]
    fn test_bad_predicate_fails_on_empty_input() {
        let predicate = FilterPredicate::at_least("product", "kinetic");
        assert!(filter(&[], &[predicate]).is_err());
    }

    #[test]
    fn test_thresholds_and_missing_values() {
        let out = filter(&rows(), &[FilterPredicate::at_least("volume", 200.0)]).unwrap();
        assert_eq!(products(&out), vec!["WrapPortal", "riskguru"]);

        // asureify has no volume and never matches
        let out = filter(&rows(), &[FilterPredicate::at_most("volume", 10_000.0)]).unwrap();
        assert_eq!(products(&out), vec!["WrapPortal", "kinetic", "riskguru"]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let out = filter(
            &rows(),
            &[
                FilterPredicate::equals("status", "success"),
                FilterPredicate::at_most("volume", 600.0),
            ],
        )
        .unwrap();
        assert_eq!(products(&out), vec!["WrapPortal"]);
    }

    #[test]
    fn test_in_set_preserves_arrival_order() {
        let out = filter(
            &rows(),
            &[FilterPredicate::in_set("status", ["error", "success"])],
        )
        .unwrap();
        assert_eq!(products(&out), vec!["WrapPortal", "asureify", "riskguru"]);
    }

    #[test]
    fn test_in_set_requires_set() {
        let predicate = FilterPredicate::new(
            "status",
            FilterOp::InSet,
            Operand::Value(Value::from("success")),
        );
        assert!(filter(&rows(), &[predicate]).is_err());
    }

    #[test]
    fn test_timestamp_threshold() {
        let early = Utc.with_ymd_and_hms(2025, 1, 18, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 1, 24, 9, 0, 0).unwrap();
        let records = vec![
            Arc::new(Record::new().with("id", "a").with("ts", early)),
            Arc::new(Record::new().with("id", "b").with("ts", late)),
        ];
        let cutoff = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let out = filter(&records, &[FilterPredicate::at_least("ts", cutoff)]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text("id"), Some("b"));

        // A numeric bound never matches timestamp values
        let out = filter(&records, &[FilterPredicate::at_least("ts", 0.0)]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_search_any_field() {
        let search = SearchQuery::new("WARN");
        let out = filter_with_search(&rows(), &[], Some(&search)).unwrap();
        assert_eq!(products(&out), vec!["kinetic"]);

        // Numbers are searched on their display text
        let search = SearchQuery::new("90");
        let out = filter_with_search(&rows(), &[], Some(&search)).unwrap();
        assert_eq!(products(&out), vec!["riskguru"]);
    }

    #[test]
    fn test_search_restricted_fields() {
        let search = SearchQuery::new("success").in_fields(["product"]);
        let out = filter_with_search(&rows(), &[], Some(&search)).unwrap();
        assert!(out.is_empty());

        let blank = SearchQuery::new("   ");
        let out = filter_with_search(&rows(), &[], Some(&blank)).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_validate_against_schema() {
        let schema = Schema::new(vec![
            FieldDescriptor::categorical("product"),
            FieldDescriptor::numeric("volume"),
            FieldDescriptor::text("notes").not_filterable(),
        ]);

        assert!(validate_predicates(&schema, &[FilterPredicate::equals("product", "kinetic")]).is_ok());

        let err = validate_predicates(&schema, &[FilterPredicate::equals("region", "eu")]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPredicate { ref field, .. } if field == "region"));

        let err = validate_predicates(&schema, &[FilterPredicate::contains("volume", "1")]).unwrap_err();
        assert_eq!(err.field(), Some("volume"));

        let err = validate_predicates(&schema, &[FilterPredicate::equals("volume", "many")]).unwrap_err();
        assert_eq!(err.field(), Some("volume"));

        let err = validate_predicates(&schema, &[FilterPredicate::contains("notes", "x")]).unwrap_err();
        assert_eq!(err.field(), Some("notes"));

        assert!(validate_predicates(&Schema::default(), &[FilterPredicate::equals("anything", 1.0)]).is_ok());
    }

    #[test]
    fn test_predicate_json_shape() {
        let predicate = FilterPredicate::in_set("product", ["kinetic", "anzenn"]);
        let json = serde_json::to_string(&predicate).unwrap();
        assert_eq!(
            json,
            r#"{"field":"product","op":"in_set","operand":["kinetic","anzenn"]}"#
        );
        let back: FilterPredicate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, predicate);
    }
}
