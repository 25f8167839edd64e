pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("JSON serialization error: {e}"),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a scalar for a single cell. Arrays and objects fall back to
/// compact JSON.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// True for a non-empty array whose first element is an object, i.e.
/// something that renders as rows (schedule, yearly buckets, unit lists).
pub(crate) fn is_row_array(value: &Value) -> bool {
    matches!(value, Value::Array(a) if matches!(a.first(), Some(Value::Object(_))))
}

/// Column headers for a row array, taken from the first row.
pub(crate) fn row_headers(rows: &[Value]) -> Vec<String> {
    match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn row_cells(row: &Value, headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| row.get(h.as_str()).map(cell).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell(&json!("377.42")), "377.42");
        assert_eq!(cell(&json!(null)), "");
        assert_eq!(cell(&json!(true)), "true");
        assert_eq!(cell(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_row_arrays() {
        let rows = json!([{"period_index": 1, "remaining_balance": "10"}]);
        assert!(is_row_array(&rows));
        assert!(!is_row_array(&json!([])));
        assert!(!is_row_array(&json!(["a"])));

        let rows = rows.as_array().unwrap();
        let headers = row_headers(rows);
        assert_eq!(headers, vec!["period_index", "remaining_balance"]);
        assert_eq!(row_cells(&rows[0], &headers), vec!["1", "10"]);
    }
}
