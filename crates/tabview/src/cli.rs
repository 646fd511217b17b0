//! Argument parsing helpers and terminal formatters
//!
//! Turns `--filter`/`--sort` strings into core request types and renders
//! views and statistics as comfy-table tables or JSON.

use anyhow::{bail, Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use std::collections::BTreeMap;
use tabview_core::models::{Schema, Value};
use tabview_core::stats::{Change, CorrelationReport, FiveNumberSummary, HistogramBucket};
use tabview_core::{AggregateResult, FilterPredicate, SortDirection, SortSpec, ViewModel};

// ============================================================================
// Request Parsing
// ============================================================================

/// Parse a filter expression
///
/// Accepted forms:
/// - `field>=value`, `field<=value` (thresholds)
/// - `field~text` (case-insensitive contains)
/// - `field in a,b,c` (set membership)
/// - `field=value` (equality)
///
/// Operands are read with `Value::parse_lossy`, so `volume>=200` compares
/// numbers and `timestamp>=2024-07-21T10:00:00Z` compares instants.
pub fn parse_filter(expr: &str) -> Result<FilterPredicate> {
    let split = |sep: &str| {
        expr.split_once(sep)
            .map(|(field, operand)| (field.trim(), operand.trim()))
    };

    let predicate = if let Some((field, operand)) = split(">=") {
        FilterPredicate::at_least(field, Value::parse_lossy(operand))
    } else if let Some((field, operand)) = split("<=") {
        FilterPredicate::at_most(field, Value::parse_lossy(operand))
    } else if let Some((field, operand)) = split(" in ") {
        let values: Vec<Value> = operand
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Value::parse_lossy)
            .collect();
        if values.is_empty() {
            bail!("Empty set in filter '{}' (expected: field in a,b,c)", expr);
        }
        FilterPredicate::in_set(field, values)
    } else if let Some((field, operand)) = split("~") {
        FilterPredicate::contains(field, operand)
    } else if let Some((field, operand)) = split("=") {
        FilterPredicate::equals(field, Value::parse_lossy(operand))
    } else {
        bail!(
            "Invalid filter '{}' (expected: field=value, field~text, field>=n, field<=n, field in a,b)",
            expr
        );
    };

    if predicate.field.is_empty() {
        bail!("Missing field name in filter '{}'", expr);
    }
    Ok(predicate)
}

/// Parse a sort expression: `field`, `field:asc`, `field:desc` or `-field`
pub fn parse_sort(expr: &str) -> Result<SortSpec> {
    let expr = expr.trim();
    if let Some(field) = expr.strip_prefix('-') {
        return Ok(SortSpec::descending(field));
    }

    let (field, direction) = match expr.rsplit_once(':') {
        Some((field, dir)) => {
            let direction = SortDirection::parse(dir)
                .with_context(|| format!("Invalid sort direction '{}' (expected: asc|desc)", dir))?;
            (field, direction)
        }
        None => (expr, SortDirection::Ascending),
    };

    if field.is_empty() {
        bail!("Missing field name in sort '{}'", expr);
    }
    Ok(SortSpec {
        field: field.to_string(),
        direction,
    })
}

// ============================================================================
// Formatters
// ============================================================================

fn header_row(columns: &[&str], no_color: bool) -> Vec<Cell> {
    columns
        .iter()
        .map(|c| {
            let cell = Cell::new(c);
            if no_color {
                cell
            } else {
                cell.fg(Color::Cyan)
            }
        })
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format a view page as table (human) or JSON
///
/// Columns follow the schema; with an empty schema they are inferred from
/// the rows on the page.
pub fn format_view(view: &ViewModel, schema: &Schema, json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(view).unwrap_or_else(|_| "{}".to_string());
    }

    if view.rows.is_empty() {
        return format!(
            "No records on page {} of {} ({} matching).",
            view.page_index, view.total_pages, view.total_count
        );
    }

    let inferred;
    let schema = if schema.is_empty() {
        inferred = Schema::infer(view.rows.iter().map(|r| r.as_ref()));
        &inferred
    } else {
        schema
    };
    let columns: Vec<&str> = schema.names().collect();

    let mut table = new_table();
    table.set_header(header_row(&columns, no_color));

    for record in &view.rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|name| {
                record
                    .get(name)
                    .map(format_value)
                    .unwrap_or_else(|| "-".to_string())
            })
            .collect();
        table.add_row(Row::from(cells));
    }

    let sort = view
        .applied_sort
        .as_ref()
        .map(|s| {
            let direction = match s.direction {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
            };
            format!(", sorted by {} {}", s.field, direction)
        })
        .unwrap_or_default();

    format!(
        "{}\nPage {}/{} · {} matching{}",
        table, view.page_index, view.total_pages, view.total_count, sort
    )
}

/// Format per-field aggregates
pub fn format_summary(
    summary: &BTreeMap<String, AggregateResult>,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        return serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string());
    }

    let mut table = new_table();
    table.set_header(header_row(&["Field", "Count", "Sum", "Mean", "Min", "Max"], no_color));

    for (field, result) in summary {
        let mut row = vec![field.clone()];
        for metric in ["count", "sum", "mean", "min", "max"] {
            row.push(format_metric(result.get(metric)));
        }
        table.add_row(Row::from(row));
    }

    table.to_string()
}

pub fn format_five_number(field: &str, summary: Option<&FiveNumberSummary>, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "null".to_string());
    }

    match summary {
        None => format!("{}: insufficient data", field),
        Some(s) => {
            let lines = [
                format!("Distribution of {} ({} values)", field, s.count),
                format!("  Min:     {}", format_number(s.min)),
                format!("  Q1:      {}", format_number(s.q1)),
                format!("  Median:  {}", format_number(s.median)),
                format!("  Q3:      {}", format_number(s.q3)),
                format!("  Max:     {}", format_number(s.max)),
                format!("  IQR:     {}", format_number(s.iqr())),
            ];
            lines.join("\n")
        }
    }
}

pub fn format_correlation(
    field_x: &str,
    field_y: &str,
    report: Option<&CorrelationReport>,
    json: bool,
) -> String {
    if json {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|_| "null".to_string());
    }

    match report {
        None => format!(
            "Correlation {} vs {}: undefined (fewer than 2 pairs or zero variance)",
            field_x, field_y
        ),
        Some(r) => format!(
            "Correlation {} vs {}: r = {:.3} ({}), r² = {:.3}",
            field_x,
            field_y,
            r.coefficient,
            r.describe(),
            r.r_squared
        ),
    }
}

pub fn format_histogram(buckets: &[HistogramBucket], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(buckets).unwrap_or_else(|_| "[]".to_string());
    }

    if buckets.is_empty() {
        return "No values to bucket.".to_string();
    }

    let mut table = new_table();
    table.set_header(header_row(&["Range", "Count", "Share", ""], no_color));
    for bucket in buckets {
        let bar = "█".repeat((bucket.percentage / 2.0).round() as usize);
        table.add_row(Row::from(vec![
            format!("{} – {}", format_number(bucket.lower), format_number(bucket.upper)),
            bucket.count.to_string(),
            format!("{:.1}%", bucket.percentage),
            bar,
        ]));
    }
    table.to_string()
}

/// One-line change indicator, e.g. "▲ 12.5%" or "= 1.2%"
pub fn format_change(change: Option<&Change>) -> String {
    match change {
        None => "n/a".to_string(),
        Some(c) if !c.significant => format!("= {}", c.magnitude_display()),
        Some(c) if c.is_increase() => format!("▲ {}", c.magnitude_display()),
        Some(c) => format!("▼ {}", c.magnitude_display()),
    }
}

// ============================================================================
// Utilities
// ============================================================================

fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        Value::Text(s) => truncate(s, 40),
    }
}

/// Undefined metrics render as a placeholder, never as 0 or NaN
fn format_metric(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "—".to_string())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.2}", n)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
