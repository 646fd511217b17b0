//! Export of complete filtered/sorted extracts
//!
//! Export bypasses pagination: callers pass the output of
//! [`crate::view::extract`] (or of `filter`/`sort` directly).

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::models::{Record, Schema};

/// Output format for extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Guess from a file extension; defaults to CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// Quote a CSV cell when it holds a delimiter, quote or line break
fn csv_cell(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Write records as CSV
///
/// Columns follow the schema order; with an empty schema the columns are
/// inferred from the records. Missing values are empty cells.
pub fn write_csv<W: Write>(records: &[Arc<Record>], schema: &Schema, writer: W) -> Result<()> {
    let inferred;
    let schema = if schema.is_empty() {
        inferred = Schema::infer(records.iter().map(|r| r.as_ref()));
        &inferred
    } else {
        schema
    };

    let mut writer = BufWriter::new(writer);

    let header: Vec<String> = schema.names().map(csv_cell).collect();
    writeln!(writer, "{}", header.join(",")).context("Failed to write CSV header")?;

    for (index, record) in records.iter().enumerate() {
        let row: Vec<String> = schema
            .names()
            .map(|name| {
                record
                    .get(name)
                    .map(|v| csv_cell(&v.to_string()))
                    .unwrap_or_default()
            })
            .collect();
        writeln!(writer, "{}", row.join(","))
            .with_context(|| format!("Failed to write CSV row {}", index + 1))?;
    }

    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

/// Write records as a pretty-printed JSON array
pub fn write_json<W: Write>(records: &[Arc<Record>], writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, records)
        .context("Failed to serialize records to JSON")?;
    writeln!(writer).context("Failed to write JSON")?;
    writer.flush().context("Failed to flush JSON writer")?;
    Ok(())
}

/// Export records to `path`, creating parent directories as needed
///
/// # Examples
///
/// ```no_run
/// use tabview_core::export::{export_records, ExportFormat};
/// use tabview_core::models::Schema;
/// use std::path::Path;
///
/// export_records(&[], &Schema::default(), Path::new("extract.csv"), ExportFormat::Csv).unwrap();
/// ```
pub fn export_records(
    records: &[Arc<Record>],
    schema: &Schema,
    path: &Path,
    format: ExportFormat,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;

    match format {
        ExportFormat::Csv => write_csv(records, schema, file),
        ExportFormat::Json => write_json(records, file),
    }
    .with_context(|| format!("Failed to export {} records to {}", records.len(), path.display()))?;

    tracing::info!(path = %path.display(), records = records.len(), ?format, "Exported records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldDescriptor;
    use tempfile::TempDir;

    fn records() -> Vec<Arc<Record>> {
        vec![
            Arc::new(
                Record::new()
                    .with("product", "kinetic")
                    .with("volume", 120.0)
                    .with("note", "spike, then \"recovered\""),
            ),
            Arc::new(Record::new().with("product", "anzenn")),
        ]
    }

    #[test]
    fn test_csv_follows_schema_order() {
        let schema = Schema::new(vec![
            FieldDescriptor::numeric("volume"),
            FieldDescriptor::categorical("product"),
            FieldDescriptor::text("note"),
        ]);
        let mut out = Vec::new();
        write_csv(&records(), &schema, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "volume,product,note");
        assert_eq!(lines[1], r#"120,kinetic,"spike, then ""recovered""""#);
        assert_eq!(lines[2], ",anzenn,");
    }

    #[test]
    fn test_csv_infers_columns() {
        let mut out = Vec::new();
        write_csv(&records(), &Schema::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next().unwrap(), "note,product,volume");
    }

    #[test]
    fn test_json_export_parses_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("extract.json");

        export_records(&records(), &Schema::default(), &path, ExportFormat::Json).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Record> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].number("volume"), Some(120.0));
    }

    #[test]
    fn test_export_creates_nested_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("exports/weekly/extract.csv");

        export_records(&records(), &Schema::default(), &nested, ExportFormat::Csv).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("a.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("noext")), ExportFormat::Csv);
    }
}
