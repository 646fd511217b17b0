//! Field descriptors shared by every record in a store

use super::record::Record;
use super::value::Value;
use serde::{Deserialize, Serialize};

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text (searchable, substring filters)
    Text,
    /// Numbers (threshold filters, statistics)
    Numeric,
    /// Small closed set of labels (equality / set filters)
    Categorical,
    /// Points in time
    Timestamp,
}

impl FieldType {
    /// Whether `contains` filters make sense on this field
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Categorical)
    }

    /// Whether threshold (`>=`, `<=`) filters make sense on this field
    pub fn is_ordered(&self) -> bool {
        matches!(self, FieldType::Numeric | FieldType::Timestamp)
    }

    /// Whether `value` is an acceptable operand for this field
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text | FieldType::Categorical => matches!(value, Value::Text(_)),
            FieldType::Numeric => matches!(value, Value::Number(_)),
            FieldType::Timestamp => matches!(value, Value::Timestamp(_)),
        }
    }

    fn of(value: &Value) -> Self {
        match value {
            Value::Number(_) => FieldType::Numeric,
            Value::Timestamp(_) => FieldType::Timestamp,
            Value::Text(_) => FieldType::Text,
        }
    }
}

/// Description of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub filterable: bool,
}

fn default_true() -> bool {
    true
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            sortable: true,
            filterable: true,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Numeric)
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Categorical)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn not_filterable(mut self) -> Self {
        self.filterable = false;
        self
    }
}

/// Ordered list of field descriptors
///
/// An empty schema means "unknown": callers skip schema validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Infer a schema from the first value seen for each field
    ///
    /// Fields are listed in first-seen order. Text fields are inferred as
    /// `Text`; declare `Categorical` explicitly where it matters.
    pub fn infer<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        for record in records {
            for (name, value) in record.iter() {
                if !fields.iter().any(|f| f.name == name) {
                    fields.push(FieldDescriptor::new(name, FieldType::of(value)));
                }
            }
        }
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Names of fields whose type is `Numeric`
    pub fn numeric_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::Numeric)
            .map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
