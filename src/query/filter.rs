//! Compiles a filter specification into predicate fragments plus the
//! matching parameter map.
//!
//! The search statement binds its node variable as `n`; every fragment
//! emitted here references that variable. Fragments join with ` AND `;
//! an empty specification compiles to no predicate at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::coerce::coerce_property;
use crate::error::Result;
use crate::ident;
use crate::value::GraphValue;

/// Parameter slots the search builder reserves for itself. A filter on a
/// property with one of these names keeps its predicate but gets a
/// prefixed parameter slot so the two never collide.
const RESERVED_SLOTS: &[&str] = &[
    "limit", "props", "node_id", "node_ids", "node1_id", "node2_id",
];

/// Comparison operator of a filter entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Property equality.
    #[serde(rename = "=")]
    Eq,
    /// Strictly less than.
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Le,
    /// Strictly greater than.
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Ge,
    /// Any element of the list-valued property is in the supplied list.
    #[serde(rename = "IN", alias = "in")]
    In,
    /// Any element of the list-valued property contains a supplied
    /// substring.
    #[serde(rename = "CONTAINS", alias = "contains")]
    Contains,
}

impl Operator {
    fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "IN",
            Operator::Contains => "CONTAINS",
        }
    }
}

/// One filter entry: operator plus raw comparison value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterItem {
    /// Comparison operator.
    pub operator: Operator,
    /// Scalar value, or a list for `IN`/`CONTAINS`.
    pub value: JsonValue,
}

/// Mapping from property name to filter entry. `BTreeMap` keeps the
/// generated predicate order deterministic.
pub type FilterSpec = BTreeMap<String, FilterItem>;

/// Output of filter compilation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompiledFilter {
    /// Predicate fragments, one per filter entry, in property-name order.
    pub fragments: Vec<String>,
    /// Parameter map matching the fragments' slots.
    pub params: BTreeMap<String, GraphValue>,
}

impl CompiledFilter {
    /// Joins the fragments into a `WHERE` clause body, or `None` when the
    /// specification was empty (unconditional match).
    pub fn where_clause(&self) -> Option<String> {
        if self.fragments.is_empty() {
            None
        } else {
            Some(self.fragments.join(" AND "))
        }
    }
}

/// Compiles the full specification. Property names are validated against
/// the identifier grammar before they reach clause position.
pub fn compile(spec: &FilterSpec) -> Result<CompiledFilter> {
    let mut compiled = CompiledFilter::default();
    for (property, item) in spec {
        ident::property(property)?;
        let slot = param_slot(property);
        match item.operator {
            Operator::In => {
                compiled.fragments.push(format!(
                    "ANY(x IN n.{property} WHERE x IN ${slot})"
                ));
                compiled
                    .params
                    .insert(slot, GraphValue::from(normalize_operands(&item.value)));
            }
            Operator::Contains => {
                if item.value.is_array() {
                    compiled.fragments.push(format!(
                        "ANY(y IN n.{property} WHERE ANY(x IN ${slot} WHERE y CONTAINS x))"
                    ));
                    compiled
                        .params
                        .insert(slot, GraphValue::from(normalize_operands(&item.value)));
                } else {
                    compiled.fragments.push(format!(
                        "ANY(y IN n.{property} WHERE y CONTAINS ${slot})"
                    ));
                    compiled.params.insert(
                        slot,
                        GraphValue::Text(stringify_operand(&item.value)),
                    );
                }
            }
            op => {
                compiled.fragments.push(format!(
                    "n.{property} {} ${slot}",
                    op.symbol()
                ));
                compiled
                    .params
                    .insert(slot, coerce_property(property, &item.value));
            }
        }
    }
    Ok(compiled)
}

/// Picks the parameter slot for a property, dodging reserved names.
fn param_slot(property: &str) -> String {
    if RESERVED_SLOTS.contains(&property) {
        format!("p_{property}")
    } else {
        property.to_owned()
    }
}

/// Normalizes an `IN`/`CONTAINS` operand to a list of trimmed strings.
/// A scalar wraps into a one-element list.
fn normalize_operands(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items.iter().map(stringify_operand).collect(),
        scalar => vec![stringify_operand(scalar)],
    }
}

fn stringify_operand(value: &JsonValue) -> String {
    GraphValue::from(value).to_operand_string().trim().to_owned()
}
