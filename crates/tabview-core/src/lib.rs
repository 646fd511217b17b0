//! tabview-core - Core library for tabview
//!
//! Provides the record model, the filter → sort → paginate view pipeline,
//! descriptive statistics, and the snapshot hub that hands immutable
//! record stores to readers.
//!
//! Every pipeline function is pure: inputs are borrowed and never mutated,
//! and identical inputs give identical outputs.

pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod filter;
pub mod models;
pub mod paginate;
pub mod sort;
pub mod stats;
pub mod store;
pub mod view;

pub use config::ViewConfig;
pub use error::{CoreError, Result};
pub use event::{EventBus, StoreEvent};
pub use export::{export_records, ExportFormat};
pub use filter::{filter, filter_with_search, FilterOp, FilterPredicate, Operand, SearchQuery};
pub use models::{FieldDescriptor, FieldType, Record, Schema, Value};
pub use paginate::{paginate, Page, PageRequest};
pub use sort::{sort, SortDirection, SortSpec};
pub use stats::{aggregate, correlation, percentile_rank, AggOp, AggregateResult};
pub use store::{RecordStore, Snapshot, SnapshotHub};
pub use view::{build_summary, build_view, extract, view_from_extract, ViewModel, ViewRequest};
