//! Typed value domain shared by query parameters and decoded result rows.
//!
//! Inbound payloads arrive as loosely-typed JSON; outbound rows come back
//! from the graph engine with real types (integers, floats, dates, lists).
//! `GraphValue` is the common currency between the two: the coercion engine
//! produces it, statements carry it as parameters, and the session layer
//! decodes result columns back into it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A property bag keyed by property name. `BTreeMap` keeps clause and
/// parameter ordering deterministic across runs.
pub type PropertyBag = BTreeMap<String, GraphValue>;

/// Scalar or composite value in the graph engine's parameter domain.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    /// Absent value. Setting a property to null removes it engine-side.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    Text(String),
    /// Calendar date; travels typed over the wire so range comparisons use
    /// date ordering rather than string ordering.
    Date(NaiveDate),
    /// Homogeneous or mixed list.
    List(Vec<GraphValue>),
    /// Nested map, used for whole-bag parameters (`SET n += $props`).
    Map(PropertyBag),
}

impl GraphValue {
    /// Integer view, if this value is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            GraphValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view covering both integer and float values.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            GraphValue::Int(v) => Some(*v as f64),
            GraphValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String view, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GraphValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Renders the value the way it appears inside a predicate operand:
    /// strings as-is, everything else via its display form. Used by the
    /// filter compiler when normalizing `IN`/`CONTAINS` operands.
    pub fn to_operand_string(&self) -> String {
        match self {
            GraphValue::Null => String::new(),
            GraphValue::Bool(v) => v.to_string(),
            GraphValue::Int(v) => v.to_string(),
            GraphValue::Float(v) => v.to_string(),
            GraphValue::Text(v) => v.clone(),
            GraphValue::Date(v) => v.format("%Y-%m-%d").to_string(),
            GraphValue::List(_) | GraphValue::Map(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    /// JSON rendering used in HTTP responses. Dates become ISO-8601
    /// strings; integer/float distinction is preserved.
    pub fn to_json(&self) -> JsonValue {
        match self {
            GraphValue::Null => JsonValue::Null,
            GraphValue::Bool(v) => JsonValue::Bool(*v),
            GraphValue::Int(v) => JsonValue::Number((*v).into()),
            GraphValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            GraphValue::Text(v) => JsonValue::String(v.clone()),
            GraphValue::Date(v) => JsonValue::String(v.format("%Y-%m-%d").to_string()),
            GraphValue::List(items) => {
                JsonValue::Array(items.iter().map(GraphValue::to_json).collect())
            }
            GraphValue::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for GraphValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GraphValue::Null => serializer.serialize_none(),
            GraphValue::Bool(v) => serializer.serialize_bool(*v),
            GraphValue::Int(v) => serializer.serialize_i64(*v),
            GraphValue::Float(v) => serializer.serialize_f64(*v),
            GraphValue::Text(v) => serializer.serialize_str(v),
            GraphValue::Date(v) => {
                serializer.serialize_str(&v.format("%Y-%m-%d").to_string())
            }
            GraphValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            GraphValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<&JsonValue> for GraphValue {
    /// Structural conversion from JSON with no reinterpretation: numbers
    /// keep their JSON type, strings stay strings. The coercion engine is
    /// the place where strings may be promoted to numbers or dates.
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => GraphValue::Null,
            JsonValue::Bool(v) => GraphValue::Bool(*v),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    GraphValue::Int(i)
                } else {
                    GraphValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => GraphValue::Text(s.clone()),
            JsonValue::Array(items) => {
                GraphValue::List(items.iter().map(GraphValue::from).collect())
            }
            JsonValue::Object(entries) => GraphValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), GraphValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for GraphValue {
    fn from(value: JsonValue) -> Self {
        GraphValue::from(&value)
    }
}

impl From<&str> for GraphValue {
    fn from(value: &str) -> Self {
        GraphValue::Text(value.to_owned())
    }
}

impl From<String> for GraphValue {
    fn from(value: String) -> Self {
        GraphValue::Text(value)
    }
}

impl From<i64> for GraphValue {
    fn from(value: i64) -> Self {
        GraphValue::Int(value)
    }
}

impl From<f64> for GraphValue {
    fn from(value: f64) -> Self {
        GraphValue::Float(value)
    }
}

impl From<bool> for GraphValue {
    fn from(value: bool) -> Self {
        GraphValue::Bool(value)
    }
}

impl From<NaiveDate> for GraphValue {
    fn from(value: NaiveDate) -> Self {
        GraphValue::Date(value)
    }
}

impl From<Vec<String>> for GraphValue {
    fn from(value: Vec<String>) -> Self {
        GraphValue::List(value.into_iter().map(GraphValue::Text).collect())
    }
}

impl From<Vec<i64>> for GraphValue {
    fn from(value: Vec<i64>) -> Self {
        GraphValue::List(value.into_iter().map(GraphValue::Int).collect())
    }
}

/// Converts a JSON object into a property bag, one entry per key.
pub fn bag_from_json(object: &serde_json::Map<String, JsonValue>) -> PropertyBag {
    object
        .iter()
        .map(|(k, v)| (k.clone(), GraphValue::from(v)))
        .collect()
}
