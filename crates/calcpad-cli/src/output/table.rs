use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, is_row_array, row_cells, row_headers};

/// Format output as tables using the tabled crate. Scalars of the result go
/// in one Field/Value table; nested objects (a loan summary) and row arrays
/// (a schedule, yearly buckets) each get their own titled table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result(result, map),
            None => print_section(None, map),
        },
        Value::Array(arr) => print_rows(None, arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_section(None, res_map),
        Value::Array(arr) => print_rows(None, arr),
        other => println!("{}", cell(other)),
    }

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

fn print_section(title: Option<&str>, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    for (key, val) in map {
        if val.is_object() || is_row_array(val) {
            continue;
        }
        builder.push_record([key.clone(), cell(val)]);
        scalars += 1;
    }
    if scalars > 0 {
        if let Some(t) = title {
            println!("\n{}", t);
        }
        println!("{}", Table::from(builder));
    }

    for (key, val) in map {
        match val {
            Value::Object(inner) => print_section(Some(key.as_str()), inner),
            Value::Array(rows) if is_row_array(val) => print_rows(Some(key.as_str()), rows),
            _ => {}
        }
    }
}

fn print_rows(title: Option<&str>, rows: &[Value]) {
    if let Some(t) = title {
        println!("\n{} ({} rows)", t, rows.len());
    }
    if rows.is_empty() {
        println!("(empty)");
        return;
    }
    if !matches!(rows.first(), Some(Value::Object(_))) {
        for item in rows {
            println!("{}", cell(item));
        }
        return;
    }

    let headers = row_headers(rows);
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        builder.push_record(row_cells(row, &headers));
    }
    println!("{}", Table::from(builder));
}
