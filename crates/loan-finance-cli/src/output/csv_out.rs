use serde_json::Value;
use std::io::{self, Write};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(value, stdout.lock()) {
        eprintln!("CSV output error: {}", e);
    }
}

/// A result holding rows (a schedule, a yearly breakdown) is written one
/// row per record; anything else as field,value pairs.
pub fn write_csv<W: Write>(value: &Value, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            let rows = body
                .values()
                .find_map(|v| v.as_array().filter(|arr| arr.iter().any(Value::is_object)));

            match rows {
                Some(arr) => write_rows(&mut wtr, arr)?,
                None => {
                    wtr.write_record(["field", "value"])?;
                    for (key, val) in body {
                        wtr.write_record([key.as_str(), &format_csv_value(val)])?;
                    }
                }
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr)?,
        _ => wtr.write_record([&format_csv_value(value)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        write_csv(value, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_schedule_rows() {
        let value = json!({"result": {
            "schedule": [
                {"payment_number": 1, "remaining_balance": "600"},
                {"payment_number": 2, "remaining_balance": "0"}
            ],
            "summary": {"payments_made": 2}
        }});
        assert_eq!(
            render(&value),
            "payment_number,remaining_balance\n1,600\n2,0\n"
        );
    }

    #[test]
    fn test_field_value_pairs() {
        let value = json!({"result": {"apr_percent": "5.37", "converged": true}});
        assert_eq!(render(&value), "field,value\napr_percent,5.37\nconverged,true\n");
    }
}
