use serde_json::Value;

use super::{format_scalar, result_body};

/// Headline figures, most specific first.
const PRIORITY_KEYS: [&str; 7] = [
    "book_value",
    "book_value_at_improvement",
    "portfolio_book_value",
    "final_book_value",
    "total_depreciation",
    "depreciation_expense",
    "method",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let body = result_body(value);

    if let Value::Object(map) = body {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(body));
}
