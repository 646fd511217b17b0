//! Export of full extracts: filtered and sorted, never paginated

use tabview_core::models::{FieldDescriptor, Record, Schema};
use tabview_core::{
    export_records, extract, ExportFormat, FilterPredicate, PageRequest, RecordStore, SortSpec,
    ViewRequest,
};
use tempfile::TempDir;

fn store() -> RecordStore {
    let schema = Schema::new(vec![
        FieldDescriptor::text("id"),
        FieldDescriptor::categorical("product"),
        FieldDescriptor::numeric("cost"),
    ]);
    let records = (1..=30)
        .map(|i| {
            Record::new()
                .with("id", format!("req_{:02}", i))
                .with("product", if i % 2 == 0 { "riskguru" } else { "asureify" })
                .with("cost", (i % 5) as f64 * 1.5)
        })
        .collect();
    RecordStore::new(schema, records)
}

#[test]
fn test_csv_extract_ignores_page_request() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("riskguru.csv");

    // Page size 1 must not truncate the export
    let request = ViewRequest::new(PageRequest::first(1))
        .with_filter(FilterPredicate::equals("product", "riskguru"))
        .with_sort(SortSpec::descending("cost"));
    let store = store();
    let records = extract(&store, &request).unwrap();
    export_records(&records, store.schema(), &path, ExportFormat::Csv).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 16);
    assert_eq!(lines[0], "id,product,cost");
    // Highest cost first; ties keep arrival order
    assert_eq!(lines[1], "req_04,riskguru,6");
    assert_eq!(lines[2], "req_14,riskguru,6");
}

#[test]
fn test_json_extract_round_trips_into_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("all.json");

    let store = store();
    let records = extract(&store, &ViewRequest::new(PageRequest::first(10))).unwrap();
    export_records(&records, store.schema(), &path, ExportFormat::Json).unwrap();

    let reloaded = RecordStore::from_json_file(&path, Some(store.schema().clone())).unwrap();
    assert_eq!(reloaded.len(), 30);
    assert_eq!(reloaded.records(), store.records());
}

#[test]
fn test_export_to_unwritable_path_fails() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let store = store();
    let result = export_records(
        store.records(),
        store.schema(),
        &blocker.join("out.csv"),
        ExportFormat::Csv,
    );
    assert!(result.is_err());
}
