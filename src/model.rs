//! Request-scoped value objects shared by the HTTP layer and the
//! operation executors.
//!
//! Everything here is built from an inbound payload and discarded when
//! the operation completes. Responses carry [`NodeRecord`] /
//! [`RelationshipRecord`] with engine identity (`elementId`) exposed as
//! an opaque string; the domain key stays the `id` property.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::value::{GraphValue, PropertyBag};

/// A freshly created node: engine identity plus labels. Creation without
/// properties has no bag to report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedNode {
    /// Opaque engine identity (`elementId`).
    pub id: String,
    /// All labels on the node.
    pub labels: Vec<String>,
}

/// A node as returned to callers: engine identity, labels, property bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    /// Opaque engine identity (`elementId`).
    pub id: String,
    /// All labels on the node.
    pub labels: Vec<String>,
    /// Property bag; dates render as ISO strings.
    pub properties: PropertyBag,
}

/// A relationship as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipRecord {
    /// Opaque engine identity (`elementId`).
    pub id: String,
    /// Property bag.
    pub properties: PropertyBag,
}

/// Aggregate results over one numeric property of one label.
///
/// `avg`/`max`/`min`/`sum` are null when the label matched no nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Matched node count.
    pub count: i64,
    /// Average of the property.
    pub avg: GraphValue,
    /// Maximum of the property.
    pub max: GraphValue,
    /// Minimum of the property.
    pub min: GraphValue,
    /// Sum of the property.
    pub sum: GraphValue,
}

/// Identifies one directed relationship by its endpoints and type.
///
/// `node1_id`/`node2_id` are business keys (the `id` property), accepted
/// as strings and integer-coerced best-effort at query-build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRef {
    /// Label of the origin node.
    pub label1: String,
    /// Business key of the origin node.
    #[serde(deserialize_with = "key_string")]
    pub node1_id: String,
    /// Label of the destination node.
    pub label2: String,
    /// Business key of the destination node.
    #[serde(deserialize_with = "key_string")]
    pub node2_id: String,
    /// Relationship type.
    pub rel_type: String,
}

impl RelationshipRef {
    /// Human-readable identification used in per-item batch messages.
    pub fn describe(&self) -> String {
        format!(
            "relationship {ty} between {l1} with id {k1} and {l2} with id {k2}",
            ty = self.rel_type,
            l1 = self.label1,
            k1 = self.node1_id,
            l2 = self.label2,
            k2 = self.node2_id,
        )
    }
}

/// Field names that address the relationship rather than describe it.
const CONTROL_FIELDS: &[&str] = &["label1", "label2", "rel_type", "node1_id", "node2_id"];

/// One bulk-upsert item: the relationship reference plus its property
/// payload carried flat at the top level of the JSON object.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipUpdateItem {
    /// Endpoints and type.
    #[serde(flatten)]
    pub rel: RelationshipRef,
    /// All flat keys of the item; control fields are filtered out when
    /// the bag is built.
    #[serde(flatten)]
    pub properties: BTreeMap<String, JsonValue>,
}

impl RelationshipUpdateItem {
    /// The property payload as a bag in the parameter domain (structural
    /// conversion; bulk items are not run through the coercion engine).
    pub fn property_bag(&self) -> PropertyBag {
        self.properties
            .iter()
            .filter(|(k, _)| !CONTROL_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), GraphValue::from(v)))
            .collect()
    }
}

/// One bulk property-removal item: reference plus property names.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipRemoveItem {
    /// Endpoints and type.
    #[serde(flatten)]
    pub rel: RelationshipRef,
    /// Names of the properties to remove.
    pub properties: Vec<String>,
}

/// Business keys arrive as strings or numbers; either way they are held
/// as strings until query-build coercion.
pub(crate) fn key_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = JsonValue::deserialize(deserializer)?;
    match value {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number key, got {other}"
        ))),
    }
}
