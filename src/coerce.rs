//! Best-effort typing of loosely-typed payload values.
//!
//! No schema is consulted. The ordering of attempts is load-bearing: it
//! decides whether a filter compares as a date, a number, or a string, so
//! it must stay exactly date → integer → float → passthrough.

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use crate::value::GraphValue;

/// Property names whose lowercased form starts with this prefix are
/// treated as calendar dates.
pub const DATE_PROPERTY_PREFIX: &str = "date_";

/// Coerces one raw payload value for the named property.
///
/// String inputs run the parse chain: ISO date (only for date-named
/// properties), then `i64`, then `f64`, then unchanged text. JSON numbers
/// and booleans already carry a type and pass through structurally; lists
/// coerce element-wise. Never fails — the worst case is the input coming
/// back as text.
pub fn coerce_property(name: &str, raw: &JsonValue) -> GraphValue {
    match raw {
        JsonValue::String(text) => coerce_text(name, text),
        JsonValue::Array(items) => {
            GraphValue::List(items.iter().map(|item| coerce_property(name, item)).collect())
        }
        other => GraphValue::from(other),
    }
}

fn coerce_text(name: &str, text: &str) -> GraphValue {
    if is_date_property(name) {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return GraphValue::Date(date);
        }
    }
    if let Ok(int) = text.parse::<i64>() {
        return GraphValue::Int(int);
    }
    if let Ok(float) = text.parse::<f64>() {
        return GraphValue::Float(float);
    }
    GraphValue::Text(text.to_owned())
}

/// Whether a property name falls under the date naming convention.
pub fn is_date_property(name: &str) -> bool {
    name.to_ascii_lowercase().starts_with(DATE_PROPERTY_PREFIX)
}

/// Best-effort integer coercion of a business-key list.
///
/// All-or-nothing: the list converts to integers only when every element
/// parses; otherwise every element stays a string. A mixed list would
/// match nothing against a uniformly-typed `id` property.
pub fn coerce_key_list(keys: &[String]) -> GraphValue {
    let ints: Option<Vec<i64>> = keys.iter().map(|k| k.trim().parse::<i64>().ok()).collect();
    match ints {
        Some(ints) => GraphValue::from(ints),
        None => GraphValue::from(keys.to_vec()),
    }
}

/// Best-effort integer coercion of a single business key.
pub fn coerce_key(key: &str) -> GraphValue {
    match key.trim().parse::<i64>() {
        Ok(int) => GraphValue::Int(int),
        Err(_) => GraphValue::Text(key.to_owned()),
    }
}
