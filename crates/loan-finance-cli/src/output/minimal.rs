use serde_json::{Map, Value};

use super::display_value;
use crate::currency::Currency;

/// Key answer fields, in order of priority.
const PRIORITY_KEYS: &[&str] = &[
    "monthly_payment",
    "loan_amount",
    "apr_percent",
    "annual_rate_percent",
    "value",
    "periods",
    "converted",
    "periodic_payment",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value, currency: Option<&Currency>) {
    println!("{}", minimal_text(value, currency));
}

/// Look for a well-known answer field in the result (or its summary), then
/// fall back to the first scalar field.
pub fn minimal_text(value: &Value, currency: Option<&Currency>) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        let summary = map.get("summary").and_then(Value::as_object);
        for candidate in std::iter::once(map).chain(summary) {
            if let Some(text) = priority_field(candidate, currency) {
                return text;
            }
        }

        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_object() && !v.is_array()) {
            return format!("{}: {}", key, display_value(key, val, currency));
        }
    }

    display_value("", result_obj, currency)
}

fn priority_field(map: &Map<String, Value>, currency: Option<&Currency>) -> Option<String> {
    PRIORITY_KEYS.iter().find_map(|key| {
        map.get(*key)
            .filter(|v| !v.is_null())
            .map(|v| display_value(key, v, currency))
    })
}
