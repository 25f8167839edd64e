use serde_json::{Map, Value};
use std::io;

use super::{cell, is_row_array, row_cells, row_headers};

/// Write output as CSV to stdout.
///
/// A result that carries rows (a payment schedule, a unit list) is written
/// as those rows; the first row array found wins. Anything else becomes a
/// two-column `field,value` listing with nested keys flattened as
/// `summary.total_interest`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => match first_row_array(map) {
            Some(rows) => write_rows(&mut wtr, rows),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                let mut flat = Vec::new();
                flatten("", map, &mut flat);
                for (key, val) in flat {
                    let _ = wtr.write_record([key, val]);
                }
            }
        },
        Value::Array(arr) => write_rows(&mut wtr, arr),
        other => {
            let _ = wtr.write_record([cell(other)]);
        }
    }

    let _ = wtr.flush();
}

fn first_row_array(map: &Map<String, Value>) -> Option<&[Value]> {
    map.values()
        .find(|v| is_row_array(v))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}

fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, out),
            _ => out.push((name, cell(val))),
        }
    }
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let headers = row_headers(rows);
    if headers.is_empty() {
        for item in rows {
            let _ = wtr.write_record([cell(item)]);
        }
        return;
    }
    let _ = wtr.write_record(&headers);
    for row in rows {
        let _ = wtr.write_record(row_cells(row, &headers));
    }
}
