//! Record snapshots and the hub that publishes them
//!
//! A `RecordStore` is immutable once built: a refresh produces a new store,
//! never an in-place edit. `SnapshotHub` holds the current store behind a
//! `parking_lot::RwLock` and swaps it on publish, so readers that already
//! cloned the previous `Arc` keep computing over a consistent snapshot.

use crate::error::{CoreError, Result};
use crate::event::{EventBus, StoreEvent};
use crate::models::{Record, Schema};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable snapshot of analytics records for one refresh cycle
///
/// Records are `Arc`-wrapped so pipeline stages can hand out new sequences
/// that point at the same rows without copying them.
#[derive(Debug, Clone)]
pub struct RecordStore {
    schema: Schema,
    records: Vec<Arc<Record>>,
    created_at: DateTime<Utc>,
}

impl RecordStore {
    /// Create a store with an explicit schema; `records` order is arrival order
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        Self {
            schema,
            records: records.into_iter().map(Arc::new).collect(),
            created_at: Utc::now(),
        }
    }

    /// Create a store whose schema is inferred from the records
    pub fn from_records(records: Vec<Record>) -> Self {
        let schema = Schema::infer(&records);
        Self::new(schema, records)
    }

    /// An empty store with no schema
    pub fn empty() -> Self {
        Self::new(Schema::default(), Vec::new())
    }

    /// Load a JSON array of flat objects
    ///
    /// The schema is inferred unless `schema` is given.
    pub fn from_json_file(path: &Path, schema: Option<Schema>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let records: Vec<Record> =
            serde_json::from_str(&content).map_err(|source| CoreError::JsonParse {
                path: path.to_path_buf(),
                message: "expected an array of flat objects".to_string(),
                source,
            })?;

        debug!(path = %path.display(), records = records.len(), "Loaded record file");

        Ok(match schema {
            Some(schema) => Self::new(schema, records),
            None => Self::from_records(records),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Records in arrival order
    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A published snapshot with its generation number
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub store: Arc<RecordStore>,
    pub generation: u64,
}

/// Holder of the current snapshot for timer-driven or manual refreshes
///
/// Generations start at 0 for the initial (possibly empty) store and grow by
/// one per publish. Consumers tag their results with the generation they
/// were computed from and drop them when `is_current` says otherwise.
pub struct SnapshotHub {
    current: RwLock<Snapshot>,
    event_bus: EventBus,
}

impl SnapshotHub {
    pub fn new(initial: RecordStore) -> Self {
        Self {
            current: RwLock::new(Snapshot {
                store: Arc::new(initial),
                generation: 0,
            }),
            event_bus: EventBus::default_capacity(),
        }
    }

    /// Replace the current snapshot; returns the new generation
    pub fn publish(&self, store: RecordStore) -> u64 {
        let record_count = store.len();
        let generation = {
            let mut current = self.current.write();
            current.generation += 1;
            current.store = Arc::new(store);
            current.generation
        };

        info!(generation, record_count, "Published record snapshot");
        self.event_bus.publish(StoreEvent::Refreshed {
            generation,
            record_count,
        });
        generation
    }

    /// Report a supplier failure; the current snapshot stays in place
    pub fn report_failure(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "Record refresh failed, keeping previous snapshot");
        self.event_bus.publish(StoreEvent::RefreshFailed(message));
    }

    pub fn current(&self) -> Snapshot {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Whether a result computed from `generation` is still the latest
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new(RecordStore::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;
    use std::io::Write;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::new().with("product", "wrapportal").with("volume", 120.0),
            Record::new().with("product", "kinetic").with("volume", 80.0),
        ]
    }

    #[test]
    fn test_store_preserves_arrival_order() {
        let store = RecordStore::from_records(sample_records());
        let products: Vec<_> = store
            .records()
            .iter()
            .map(|r| r.text("product").unwrap())
            .collect();
        assert_eq!(products, vec!["wrapportal", "kinetic"]);
        assert_eq!(store.schema().get("volume").unwrap().field_type, FieldType::Numeric);
    }

    #[test]
    fn test_publish_bumps_generation() {
        let hub = SnapshotHub::default();
        assert_eq!(hub.generation(), 0);
        assert!(hub.current().store.is_empty());

        let generation = hub.publish(RecordStore::from_records(sample_records()));
        assert_eq!(generation, 1);
        assert!(hub.is_current(1));
        assert!(!hub.is_current(0));
        assert_eq!(hub.current().store.len(), 2);
    }

    #[test]
    fn test_old_snapshot_unaffected_by_publish() {
        let hub = SnapshotHub::new(RecordStore::from_records(sample_records()));
        let before = hub.current();

        hub.publish(RecordStore::empty());

        assert_eq!(before.store.len(), 2);
        assert_eq!(before.generation, 0);
        assert!(hub.current().store.is_empty());
    }

    #[tokio::test]
    async fn test_publish_notifies_subscribers() {
        let hub = SnapshotHub::default();
        let mut rx = hub.event_bus().subscribe();

        hub.publish(RecordStore::from_records(sample_records()));
        hub.report_failure("timeout");

        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::Refreshed {
                generation: 1,
                record_count: 2
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::RefreshFailed("timeout".to_string())
        );
        assert_eq!(hub.generation(), 1);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"product":"asureify","volume":300}},{{"product":"anzenn"}}]"#
        )
        .unwrap();

        let store = RecordStore::from_json_file(file.path(), None).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].number("volume"), Some(300.0));
    }

    #[test]
    fn test_from_json_file_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"product":"asureify"}}"#).unwrap();

        let err = RecordStore::from_json_file(file.path(), None).unwrap_err();
        assert!(matches!(err, CoreError::JsonParse { .. }));
    }
}
