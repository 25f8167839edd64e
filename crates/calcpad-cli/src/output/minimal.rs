use serde_json::{Map, Value};

use super::cell;

/// Headline answers, most specific first. A loan result nests its headline
/// under `summary`, so that object is searched too.
const PRIORITY_KEYS: &[&str] = &[
    "required_payment",
    "periodic_payment",
    "converted",
    "result",
    "bmi",
    "irr",
    "npv",
    "value",
    "count",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = headline(map) {
            println!("{}", cell(val));
            return;
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, cell(val));
            return;
        }
    }

    println!("{}", cell(result_obj));
}

fn headline(map: &Map<String, Value>) -> Option<&Value> {
    let nested = map.get("summary").and_then(Value::as_object);
    PRIORITY_KEYS.iter().find_map(|key| {
        map.get(*key)
            .or_else(|| nested.and_then(|s| s.get(*key)))
            .filter(|v| !v.is_null())
    })
}
