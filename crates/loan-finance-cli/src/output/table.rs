use serde_json::{Map, Value};
use std::fmt::Write;
use tabled::{builder::Builder, Table};

use super::display_value;
use crate::currency::Currency;

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value, currency: Option<&Currency>) {
    print!("{}", render_table(value, currency));
}

/// Scalar fields go into one Field/Value table; nested objects (a schedule
/// summary) and arrays of rows (the schedule itself) get their own titled
/// tables below it.
pub fn render_table(value: &Value, currency: Option<&Currency>) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                render_object(&mut out, result, currency);
                render_envelope(&mut out, map);
            }
            _ => render_object(&mut out, map, currency),
        },
        Value::Array(arr) => render_rows(&mut out, arr, currency),
        _ => {
            let _ = writeln!(out, "{}", value);
        }
    }
    out
}

fn render_object(out: &mut String, map: &Map<String, Value>, currency: Option<&Currency>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections: Vec<(&String, &Value)> = Vec::new();
    let mut scalars = 0;

    for (key, val) in map {
        match val {
            Value::Object(_) => sections.push((key, val)),
            Value::Array(arr) if arr.iter().any(Value::is_object) => sections.push((key, val)),
            _ => {
                builder.push_record([key.clone(), display_value(key, val, currency)]);
                scalars += 1;
            }
        }
    }
    if scalars > 0 {
        let _ = writeln!(out, "{}", Table::from(builder));
    }

    for (key, val) in sections {
        let _ = writeln!(out, "\n{}:", title(key));
        match val {
            Value::Object(inner) => render_object(out, inner, currency),
            Value::Array(arr) => render_rows(out, arr, currency),
            _ => {}
        }
    }
}

fn render_rows(out: &mut String, arr: &[Value], currency: Option<&Currency>) {
    if arr.is_empty() {
        let _ = writeln!(out, "(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(|v| display_value(h, v, currency))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }
        let _ = writeln!(out, "{}", Table::from(builder));
    } else {
        for item in arr {
            let _ = writeln!(out, "{}", display_value("", item, currency));
        }
    }
}

fn render_envelope(out: &mut String, envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            let _ = writeln!(out, "\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    let _ = writeln!(out, "  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        let _ = writeln!(out, "\nMethodology: {}", meth);
    }
}

fn title(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::lookup;
    use serde_json::json;

    #[test]
    fn test_result_envelope_sections() {
        let value = json!({
            "result": {
                "summary": {"total_interest": "115838.19", "payments_made": 360},
                "schedule": [
                    {"payment_number": 1, "interest_portion": "500", "remaining_balance": "99900.45"},
                    {"payment_number": 2, "interest_portion": "499.50", "remaining_balance": "99800.40"}
                ]
            },
            "warnings": ["Payment does not cover interest"],
            "methodology": "Level-payment amortization"
        });

        let text = render_table(&value, lookup("USD").ok());
        assert!(text.contains("Summary:"));
        assert!(text.contains("Schedule:"));
        assert!(text.contains("payment_number"));
        assert!(text.contains("$99900.45"));
        assert!(text.contains("$115838.19"));
        assert!(text.contains("Warnings:"));
        assert!(text.contains("Methodology: Level-payment amortization"));
    }

    #[test]
    fn test_flat_object_without_currency() {
        let value = json!({"monthly_payment": "599.5505", "periods": 360});
        let text = render_table(&value, None);
        assert!(text.contains("599.5505"));
        assert!(!text.contains('$'));
    }

    #[test]
    fn test_title() {
        assert_eq!(title("yearly"), "Yearly");
        assert_eq!(title("search_config"), "Search config");
    }
}
