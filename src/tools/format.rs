//! Result formatting for query output.
//!
//! Renders a result set (rows already carrying canonical scalar values,
//! see [`crate::db::types`]) as JSON, CSV, or a Markdown table.

use crate::error::{DbError, DbResult};
use crate::models::OutputFormat;
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

/// Render a cell value for CSV and Markdown output.
///
/// NULL is rendered per format: `NULL` in Markdown cells, the empty string
/// in CSV fields.
fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

fn csv_field(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        other => format_value(other),
    }
}

/// Format rows according to the requested output format.
pub fn format_rows(
    rows: &[serde_json::Map<String, JsonValue>],
    format: OutputFormat,
) -> DbResult<String> {
    match format {
        OutputFormat::Json => format_as_json(rows),
        OutputFormat::Csv => format_as_csv(rows),
        OutputFormat::Markdown => Ok(format_as_markdown(rows)),
    }
}

/// Format rows as a pretty-printed JSON array of objects.
fn format_as_json(rows: &[serde_json::Map<String, JsonValue>]) -> DbResult<String> {
    serde_json::to_string_pretty(rows)
        .map_err(|e| DbError::execution(format!("failed to serialize rows as JSON: {e}")))
}

/// Format rows as CSV with a header row from the first row's column order.
///
/// An empty row set yields the empty string, not a header-only CSV.
fn format_as_csv(rows: &[serde_json::Map<String, JsonValue>]) -> DbResult<String> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };

    let columns: Vec<&String> = first.keys().collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&columns)
        .map_err(|e| DbError::execution(format!("CSV write failed: {e}")))?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|col| row.get(*col).map(csv_field).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| DbError::execution(format!("CSV write failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DbError::execution(format!("CSV write failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| DbError::execution(format!("CSV output not UTF-8: {e}")))
}

/// Format rows as a Markdown table with padded columns.
///
/// Each column is as wide as the longer of its header and its widest cell,
/// with one space of padding on each side. An empty row set yields the
/// literal text "No results".
fn format_as_markdown(rows: &[serde_json::Map<String, JsonValue>]) -> String {
    let Some(first) = rows.first() else {
        return "No results".to_string();
    };

    let columns: Vec<&String> = first.keys().collect();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();

    for row in rows {
        for (i, col) in columns.iter().enumerate() {
            if let Some(value) = row.get(*col) {
                widths[i] = widths[i].max(format_value(value).width());
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);

    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {:<width$} ", col, width = w))
        .collect::<String>()
        + "|";
    lines.push(header);

    let separator: String = widths
        .iter()
        .map(|w| format!("|{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "|";
    lines.push(separator);

    for row in rows {
        let row_str: String = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| {
                let value = row.get(*col).cloned().unwrap_or(JsonValue::Null);
                format!("| {:<width$} ", format_value(&value), width = w)
            })
            .collect::<String>()
            + "|";
        lines.push(row_str);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, JsonValue)]) -> serde_json::Map<String, JsonValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_rows_json() {
        let out = format_rows(&[], OutputFormat::Json).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_empty_rows_csv_is_empty_string() {
        let out = format_rows(&[], OutputFormat::Csv).unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_empty_rows_markdown() {
        let out = format_rows(&[], OutputFormat::Markdown).unwrap();
        assert_eq!(out, "No results");
    }

    #[test]
    fn test_json_preserves_column_order() {
        let rows = vec![row(&[("z", json!(1)), ("a", json!(2))])];
        let out = format_rows(&rows, OutputFormat::Json).unwrap();
        let z_pos = out.find("\"z\"").unwrap();
        let a_pos = out.find("\"a\"").unwrap();
        assert!(z_pos < a_pos, "column order must follow the result set");
    }

    #[test]
    fn test_csv_header_and_rows() {
        let rows = vec![
            row(&[("id", json!(1)), ("name", json!("alice"))]),
            row(&[("id", json!(2)), ("name", json!("bob"))]),
        ];
        let out = format_rows(&rows, OutputFormat::Csv).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("id,name"));
        assert_eq!(lines.next(), Some("1,alice"));
        assert_eq!(lines.next(), Some("2,bob"));
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let rows = vec![row(&[("note", json!("a,b"))])];
        let out = format_rows(&rows, OutputFormat::Csv).unwrap();
        assert!(out.contains("\"a,b\""));
    }

    #[test]
    fn test_csv_null_is_empty_field() {
        let rows = vec![row(&[("a", JsonValue::Null), ("b", json!(1))])];
        let out = format_rows(&rows, OutputFormat::Csv).unwrap();
        assert!(out.lines().nth(1).unwrap().starts_with(','));
    }

    #[test]
    fn test_markdown_table_shape() {
        let rows = vec![row(&[("id", json!(1)), ("name", json!("alice"))])];
        let out = format_rows(&rows, OutputFormat::Markdown).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("| id "));
        assert!(lines[0].contains("| name  "));
        assert!(lines[1].starts_with("|--"));
        assert!(lines[2].contains("| alice "));
    }

    #[test]
    fn test_markdown_pads_to_widest_cell() {
        let rows = vec![
            row(&[("name", json!("a"))]),
            row(&[("name", json!("much_longer_value"))]),
        ];
        let out = format_rows(&rows, OutputFormat::Markdown).unwrap();
        // Header padded to the widest cell width plus one space each side.
        let header = out.lines().next().unwrap();
        assert_eq!(header.len(), "| much_longer_value |".len());
    }

    #[test]
    fn test_markdown_null_rendering() {
        let rows = vec![row(&[("v", JsonValue::Null)])];
        let out = format_rows(&rows, OutputFormat::Markdown).unwrap();
        assert!(out.contains("NULL"));
    }
}
