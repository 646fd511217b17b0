//! Error types for tabview-core
//!
//! Misuse of the pipeline (bad predicates, bad page requests, empty
//! distributions) is an error. Statistics that cannot be computed from the
//! data at hand are not: they come back as `None`.
//!
//! A filter naming a field the schema does not declare is an
//! `InvalidPredicate`; `UnknownField` is reserved for the sort field.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tabview operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Pipeline Errors
    // ===================
    #[error("Invalid predicate on field '{field}': {reason}")]
    InvalidPredicate { field: String, reason: String },

    /// Sort on a field the schema does not declare. Filters on unknown
    /// fields are `InvalidPredicate`.
    #[error("Unknown sort field: {field}")]
    UnknownField { field: String },

    #[error("Field '{field}' is not sortable")]
    NotSortable { field: String },

    #[error("Invalid page request: page size must be positive (got {page_size})")]
    InvalidPageRequest { page_size: usize },

    #[error("Cannot compute percentile rank against an empty distribution")]
    EmptyDistribution,

    #[error("Invalid histogram bucket width: {width}")]
    InvalidBucketWidth { width: f64 },

    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===================
    // Parse Errors
    // ===================
    #[error("Failed to parse JSON in {path}: {message}")]
    JsonParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML in {path}: {message}")]
    TomlParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    /// Build an `InvalidPredicate` for `field`
    pub fn invalid_predicate(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPredicate {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Field name the error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidPredicate { field, .. }
            | Self::UnknownField { field }
            | Self::NotSortable { field } => Some(field),
            _ => None,
        }
    }

    /// Returns true for errors caused by caller-supplied view parameters
    ///
    /// The presentation layer shows these inline next to the control that
    /// produced them; everything else is an environment failure.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPredicate { .. }
                | Self::UnknownField { .. }
                | Self::NotSortable { .. }
                | Self::InvalidPageRequest { .. }
                | Self::EmptyDistribution
                | Self::InvalidBucketWidth { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_predicate_names_field() {
        let err = CoreError::invalid_predicate("product", "contains requires a text operand");
        assert_eq!(err.field(), Some("product"));
        assert!(err.to_string().contains("product"));
        assert!(err.is_request_error());
    }

    #[test]
    fn test_page_request_error_carries_size() {
        let err = CoreError::InvalidPageRequest { page_size: 0 };
        assert!(err.to_string().contains("got 0"));
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_io_errors_are_not_request_errors() {
        let err = CoreError::FileRead {
            path: PathBuf::from("/tmp/records.json"),
            source: std::io::Error::other("permission denied"),
        };
        assert!(!err.is_request_error());
    }
}
