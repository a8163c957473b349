//! PostgreSQL value decoding into canonical JSON scalars.
//!
//! Every result row is converted to an ordered JSON map with one canonical
//! serialization per scalar class, applied uniformly across all output
//! formats:
//! - timestamps, dates, and times become ISO-8601 text
//! - NUMERIC becomes a floating-point number (precision loss is a
//!   documented trade-off)
//! - BYTEA becomes UTF-8 text with replacement characters for
//!   undecodable bytes
//! - NULL stays null

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

/// Wrapper decoding NUMERIC/DECIMAL columns via their text representation.
#[derive(Debug)]
struct RawNumeric(String);

impl Type<sqlx::Postgres> for RawNumeric {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawNumeric {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawNumeric(s.to_string()))
    }
}

/// Get the column names of a row in result order.
pub fn column_names(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Convert a row into an ordered JSON map with canonical scalar values.
pub fn row_to_json_map(row: &PgRow) -> serde_json::Map<String, JsonValue> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let type_name = col.type_info().name().to_lowercase();
            (col.name().to_string(), decode_column(row, idx, &type_name))
        })
        .collect()
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> JsonValue {
    match type_name {
        "int2" | "int4" | "int8" => decode_integer(row, idx),
        "float4" | "float8" => decode_float(row, idx),
        "numeric" => decode_numeric(row, idx),
        "bool" => decode_boolean(row, idx),
        "timestamptz" => decode_timestamptz(row, idx),
        "timestamp" => decode_timestamp(row, idx),
        "date" => decode_date(row, idx),
        "time" => decode_time(row, idx),
        "bytea" => decode_binary(row, idx),
        "json" | "jsonb" => decode_json(row, idx),
        name if name.ends_with("[]") => decode_text_array(row, idx),
        _ => decode_text(row, idx),
    }
}

fn decode_integer(row: &PgRow, idx: usize) -> JsonValue {
    if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Null;
    }
    if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    JsonValue::Null
}

fn decode_float(row: &PgRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return float_to_json(v);
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return float_to_json(v as f64);
    }
    JsonValue::Null
}

/// NUMERIC decodes via text, then parses to f64.
fn decode_numeric(row: &PgRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<RawNumeric>, _>(idx) {
        Ok(Some(raw)) => match raw.0.parse::<f64>() {
            Ok(v) => float_to_json(v),
            Err(_) => JsonValue::String(raw.0),
        },
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::error!(error = ?e, "Failed to decode NUMERIC column");
            JsonValue::Null
        }
    }
}

/// NaN and infinity have no JSON number representation; fall back to text.
fn float_to_json(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn decode_boolean(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<bool>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::Bool)
        .unwrap_or(JsonValue::Null)
}

fn decode_timestamptz(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<DateTime<Utc>>, _>(idx)
        .ok()
        .flatten()
        .map(|dt| JsonValue::String(dt.to_rfc3339()))
        .unwrap_or(JsonValue::Null)
}

fn decode_timestamp(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<NaiveDateTime>, _>(idx)
        .ok()
        .flatten()
        .map(|dt| JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
        .unwrap_or(JsonValue::Null)
}

fn decode_date(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<NaiveDate>, _>(idx)
        .ok()
        .flatten()
        .map(|d| JsonValue::String(d.to_string()))
        .unwrap_or(JsonValue::Null)
}

fn decode_time(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<NaiveTime>, _>(idx)
        .ok()
        .flatten()
        .map(|t| JsonValue::String(t.to_string()))
        .unwrap_or(JsonValue::Null)
}

fn decode_binary(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|bytes| JsonValue::String(binary_to_text(&bytes)))
        .unwrap_or(JsonValue::Null)
}

/// Decode binary data as UTF-8 text, replacing undecodable bytes with U+FFFD.
pub fn binary_to_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_json(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<JsonValue>, _>(idx)
        .ok()
        .flatten()
        .unwrap_or(JsonValue::Null)
}

fn decode_text_array(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<Vec<String>>, _>(idx)
        .ok()
        .flatten()
        .map(|items| JsonValue::Array(items.into_iter().map(JsonValue::String).collect()))
        .unwrap_or(JsonValue::Null)
}

/// Text-like types (varchar, text, char, uuid, interval, enums, ...) all
/// serialize as their string representation.
fn decode_text(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<String>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::String)
        .unwrap_or(JsonValue::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_to_text_valid_utf8() {
        assert_eq!(binary_to_text(b"hello world"), "hello world");
    }

    #[test]
    fn test_binary_to_text_invalid_utf8_uses_replacement() {
        let decoded = binary_to_text(&[0x68, 0x69, 0xFF, 0xFE]);
        assert!(decoded.starts_with("hi"));
        assert!(decoded.contains('\u{FFFD}'));
    }

    #[test]
    fn test_binary_to_text_empty() {
        assert_eq!(binary_to_text(&[]), "");
    }

    #[test]
    fn test_float_to_json_finite() {
        assert_eq!(float_to_json(1.5), serde_json::json!(1.5));
    }

    #[test]
    fn test_float_to_json_nan_falls_back_to_text() {
        let value = float_to_json(f64::NAN);
        assert!(matches!(value, JsonValue::String(_)));
    }
}
