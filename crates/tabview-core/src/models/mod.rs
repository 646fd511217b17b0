//! Data models for tabview

pub mod record;
pub mod schema;
pub mod value;

pub use record::Record;
pub use schema::{FieldDescriptor, FieldType, Schema};
pub use value::Value;
