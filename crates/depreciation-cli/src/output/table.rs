use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_body, scalar_fields, schedule_rows};

/// Format output as tables: scalar fields first, then the schedule.
pub fn print_table(value: &Value) {
    match result_body(value) {
        Value::Object(body) => {
            print_fields(body);
            if let Some((key, rows)) = schedule_rows(body) {
                println!("\n{}:", key);
                print_rows(rows);
            }
        }
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", format_scalar(other)),
    }

    if let Some(envelope) = value.as_object() {
        print_envelope_notes(envelope);
    }
}

fn print_fields(body: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut any = false;
    for (key, val) in scalar_fields(body) {
        builder.push_record([key.clone(), format_scalar(val)]);
        any = true;
    }
    if any {
        println!("{}", Table::from(builder));
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            println!("{}", format_scalar(row));
        }
        return;
    };

    let headers: Vec<String> = first
        .iter()
        .filter(|(_, v)| !matches!(v, Value::Array(_) | Value::Object(_)))
        .map(|(k, _)| k.clone())
        .collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(format_scalar).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
