pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Schedule-like arrays, most useful first.
const ROW_KEYS: [&str; 4] = [
    "annual_schedule",
    "annual_totals",
    "monthly_schedule",
    "supported",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The computed body: the `result` of an envelope, or the value itself.
pub(crate) fn result_body(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// First non-empty schedule array in `body`, with its key.
pub(crate) fn schedule_rows(body: &Map<String, Value>) -> Option<(&'static str, &[Value])> {
    ROW_KEYS.iter().find_map(|key| match body.get(*key) {
        Some(Value::Array(rows)) if !rows.is_empty() => Some((*key, rows.as_slice())),
        _ => None,
    })
}

/// Scalar fields of `body`; arrays and nested objects are left to the
/// row printers.
pub(crate) fn scalar_fields(body: &Map<String, Value>) -> impl Iterator<Item = (&String, &Value)> {
    body.iter()
        .filter(|(_, v)| !matches!(v, Value::Array(_) | Value::Object(_)))
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
