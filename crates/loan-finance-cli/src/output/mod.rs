pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::currency::{self, Currency};
use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
///
/// The currency only labels money fields in the human-readable formats;
/// JSON and CSV stay raw.
pub fn format_output(format: &OutputFormat, value: &Value, currency: Option<&Currency>) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value, currency),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value, currency),
    }
}

/// Plain-text rendering of one JSON value, with money fields labelled.
pub(crate) fn display_value(key: &str, value: &Value, currency: Option<&Currency>) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| display_value(key, v, currency)).collect();
            return items.join(", ");
        }
        Value::Object(_) => return serde_json::to_string(value).unwrap_or_default(),
    };

    match currency {
        Some(c) if currency::is_money_field(key) => currency::format_amount(&text, c),
        _ => text,
    }
}
