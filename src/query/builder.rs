//! One statement constructor per operation kind.
//!
//! Labels, relationship types, and property names are spliced into the
//! statement text (the engine cannot take them as parameters), so every
//! name passes the identifier grammar first. All values travel as
//! parameters. Identity columns use `elementId(..)` throughout; the
//! domain key is always the `id` *property*.

use serde_json::Value as JsonValue;

use crate::coerce::{coerce_key, coerce_key_list, coerce_property};
use crate::error::{RedifyError, Result};
use crate::ident;
use crate::model::RelationshipRef;
use crate::query::filter::{self, FilterSpec};
use crate::query::statement::{ColumnKind, Statement};
use crate::value::{GraphValue, PropertyBag};

/// Default result cap for searches.
pub const DEFAULT_SEARCH_LIMIT: i64 = 100;

/// Minimum label count for multi-label creation.
pub const MIN_CREATE_LABELS: usize = 2;

/// Minimum property count for node creation with properties.
pub const MIN_NODE_PROPERTIES: usize = 5;

/// Minimum property count for relationship creation.
pub const MIN_RELATIONSHIP_PROPERTIES: usize = 3;

/// `CREATE (n:Label)` with a single label.
pub fn create_node(label: &str) -> Result<Statement> {
    ident::label(label)?;
    Ok(Statement::new(format!(
        "CREATE (n:{label}) RETURN elementId(n) AS node_id, labels(n) AS labels"
    ))
    .returning("node_id", ColumnKind::Text)
    .returning("labels", ColumnKind::TextList))
}

/// `CREATE (n:L1:L2…)` with at least two labels.
pub fn create_node_multi(labels: &[String]) -> Result<Statement> {
    if labels.len() < MIN_CREATE_LABELS {
        return Err(RedifyError::validation(
            "at least two labels are required for multi-label creation",
        ));
    }
    ident::labels(labels)?;
    let joined = labels.join(":");
    Ok(Statement::new(format!(
        "CREATE (n:{joined}) RETURN elementId(n) AS node_id, labels(n) AS labels"
    ))
    .returning("node_id", ColumnKind::Text)
    .returning("labels", ColumnKind::TextList))
}

/// `CREATE (n:Label) SET n.k = $k, …` with at least five properties.
/// Parameter slots are named after the properties themselves; the bag is
/// passed through with its JSON typing intact.
pub fn create_node_with_properties(
    label: &str,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<Statement> {
    if properties.len() < MIN_NODE_PROPERTIES {
        return Err(RedifyError::validation(format!(
            "at least {MIN_NODE_PROPERTIES} properties are required, got {}",
            properties.len()
        )));
    }
    ident::label(label)?;
    ident::properties(properties.keys())?;
    let assignments = properties
        .keys()
        .map(|key| format!("n.{key} = ${key}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut statement = Statement::new(format!(
        "CREATE (n:{label}) SET {assignments} \
         RETURN elementId(n) AS node_id, labels(n) AS labels, n AS node"
    ));
    for (key, value) in properties {
        statement = statement.param(key.clone(), GraphValue::from(value));
    }
    Ok(statement
        .returning("node_id", ColumnKind::Text)
        .returning("labels", ColumnKind::TextList)
        .returning("node", ColumnKind::Node))
}

/// `MATCH (n:Label { id: $node_id })` returning the full node.
pub fn get_node(label: &str, key: &str) -> Result<Statement> {
    ident::label(label)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label} {{ id: $node_id }}) \
         RETURN elementId(n) AS node_id, labels(n) AS labels, n AS node"
    ))
    .param("node_id", coerce_key(key))
    .returning("node_id", ColumnKind::Text)
    .returning("labels", ColumnKind::TextList)
    .returning("node", ColumnKind::Node))
}

/// Label-scoped, filtered, limited search.
pub fn search_nodes(
    labels: &[String],
    filters: &FilterSpec,
    limit: Option<i64>,
) -> Result<Statement> {
    ident::labels(labels)?;
    let compiled = filter::compile(filters)?;

    let mut text = String::from("MATCH (n");
    if !labels.is_empty() {
        text.push(':');
        text.push_str(&labels.join(":"));
    }
    text.push(')');
    if let Some(clause) = compiled.where_clause() {
        text.push_str(" WHERE ");
        text.push_str(&clause);
    }
    text.push_str(
        " RETURN elementId(n) AS node_id, labels(n) AS labels, n AS node LIMIT $limit",
    );

    Ok(Statement::new(text)
        .params(compiled.params)
        .param("limit", limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .returning("node_id", ColumnKind::Text)
        .returning("labels", ColumnKind::TextList)
        .returning("node", ColumnKind::Node))
}

/// Count/avg/max/min/sum over one property of one label, in one row.
pub fn aggregate_nodes(label: &str, property: &str) -> Result<Statement> {
    ident::label(label)?;
    ident::property(property)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label}) \
         RETURN COUNT(n) AS count, AVG(n.{property}) AS avg, MAX(n.{property}) AS max, \
         MIN(n.{property}) AS min, SUM(n.{property}) AS sum"
    ))
    .returning("count", ColumnKind::Count)
    .returning("avg", ColumnKind::Number)
    .returning("max", ColumnKind::Number)
    .returning("min", ColumnKind::Number)
    .returning("sum", ColumnKind::Number))
}

/// Single-node `SET n += $props`. Values run through the coercion engine,
/// so numeric and date strings land typed.
pub fn update_node_properties(
    label: &str,
    key: &str,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<Statement> {
    ident::label(label)?;
    let bag = coerced_bag(properties)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label} {{ id: $node_id }}) SET n += $props \
         RETURN elementId(n) AS node_id, labels(n) AS labels, n AS node"
    ))
    .param("node_id", coerce_key(key))
    .param("props", GraphValue::Map(bag))
    .returning("node_id", ColumnKind::Text)
    .returning("labels", ColumnKind::TextList)
    .returning("node", ColumnKind::Node))
}

/// Bulk `SET n += $props` over a key list. The bag keeps its JSON typing;
/// only the key list gets best-effort integer coercion.
pub fn update_nodes_properties(
    label: &str,
    keys: &[String],
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<Statement> {
    ident::label(label)?;
    let bag = raw_bag(properties)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label}) WHERE n.id IN $node_ids SET n += $props \
         RETURN count(n) AS updatedCount"
    ))
    .param("node_ids", coerce_key_list(keys))
    .param("props", GraphValue::Map(bag))
    .returning("updatedCount", ColumnKind::Count))
}

/// Single-node `REMOVE n.p1, …`, returning the surviving node.
pub fn remove_node_properties(label: &str, key: &str, properties: &[String]) -> Result<Statement> {
    ident::label(label)?;
    let clause = remove_clause("n", properties)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label} {{ id: $node_id }}) REMOVE {clause} \
         RETURN elementId(n) AS node_id, labels(n) AS labels, n AS node"
    ))
    .param("node_id", coerce_key(key))
    .returning("node_id", ColumnKind::Text)
    .returning("labels", ColumnKind::TextList)
    .returning("node", ColumnKind::Node))
}

/// Bulk `REMOVE n.p1, …` over a key list; counts matched nodes, so
/// removing an already-absent property is a no-op rather than an error.
pub fn remove_nodes_properties(
    label: &str,
    keys: &[String],
    properties: &[String],
) -> Result<Statement> {
    ident::label(label)?;
    let clause = remove_clause("n", properties)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label}) WHERE n.id IN $node_ids REMOVE {clause} \
         RETURN count(n) AS updatedCount"
    ))
    .param("node_ids", coerce_key_list(keys))
    .returning("updatedCount", ColumnKind::Count))
}

/// Existence/relationship pre-check for delete-class operations. The
/// `OPTIONAL MATCH` keeps the base row alive when no relationship exists.
pub fn node_delete_check(label: &str, key: &str) -> Result<Statement> {
    node_delete_check_keyed(label, coerce_key(key))
}

/// As [`node_delete_check`], for a key that is already typed. Batch
/// loops coerce their whole key list up front (all-or-nothing) and feed
/// the typed keys through here.
pub fn node_delete_check_keyed(label: &str, key: GraphValue) -> Result<Statement> {
    ident::label(label)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label} {{ id: $node_id }}) OPTIONAL MATCH (n)-[r]-() \
         RETURN elementId(n) AS node_id, count(r) AS rel_count"
    ))
    .param("node_id", key)
    .returning("node_id", ColumnKind::Text)
    .returning("rel_count", ColumnKind::Count))
}

/// Unconditional single-node delete. Only issued after the delete check
/// reported the node deletable.
pub fn delete_node(label: &str, key: &str) -> Result<Statement> {
    delete_node_keyed(label, coerce_key(key))
}

/// As [`delete_node`], for a key that is already typed.
pub fn delete_node_keyed(label: &str, key: GraphValue) -> Result<Statement> {
    ident::label(label)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label} {{ id: $node_id }}) DELETE n"
    ))
    .param("node_id", key))
}

/// Label-wide `DETACH DELETE`, the explicitly check-free bulk variant.
pub fn detach_delete_by_label(label: &str) -> Result<Statement> {
    ident::label(label)?;
    Ok(Statement::new(format!(
        "MATCH (n:{label}) DETACH DELETE n RETURN count(n) AS deletedCount"
    ))
    .returning("deletedCount", ColumnKind::Count))
}

/// Directed relationship creation between two existing nodes. Both
/// endpoints are matched in one statement: if either is absent the query
/// yields no row and nothing is created.
pub fn create_relationship(
    rel: &RelationshipRef,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<Statement> {
    if properties.len() < MIN_RELATIONSHIP_PROPERTIES {
        return Err(RedifyError::validation(format!(
            "at least {MIN_RELATIONSHIP_PROPERTIES} properties are required for a relationship, got {}",
            properties.len()
        )));
    }
    validate_ref(rel)?;
    let bag = raw_bag(properties)?;
    Ok(Statement::new(format!(
        "MATCH (n1:{l1} {{ id: $node1_id }}), (n2:{l2} {{ id: $node2_id }}) \
         CREATE (n1)-[r:{ty} $props]->(n2) \
         RETURN elementId(r) AS rel_id, r AS rel",
        l1 = rel.label1,
        l2 = rel.label2,
        ty = rel.rel_type,
    ))
    .param("node1_id", coerce_key(&rel.node1_id))
    .param("node2_id", coerce_key(&rel.node2_id))
    .param("props", GraphValue::Map(bag))
    .returning("rel_id", ColumnKind::Text)
    .returning("rel", ColumnKind::Relationship))
}

/// Single directed relationship update by endpoints and type.
pub fn update_relationship(
    rel: &RelationshipRef,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<Statement> {
    validate_ref(rel)?;
    let bag = raw_bag(properties)?;
    Ok(Statement::new(format!(
        "MATCH (a:{l1} {{ id: $node1_id }})-[r:{ty}]->(b:{l2} {{ id: $node2_id }}) \
         SET r += $props RETURN elementId(r) AS rel_id, r AS rel",
        l1 = rel.label1,
        l2 = rel.label2,
        ty = rel.rel_type,
    ))
    .param("node1_id", coerce_key(&rel.node1_id))
    .param("node2_id", coerce_key(&rel.node2_id))
    .param("props", GraphValue::Map(bag))
    .returning("rel_id", ColumnKind::Text)
    .returning("rel", ColumnKind::Relationship))
}

/// Bulk-item upsert: both endpoints must exist, then the relationship is
/// merged and its properties applied on either branch. Aggregating over
/// the match means a missing endpoint reports count 0 instead of failing.
pub fn upsert_relationship(
    rel: &RelationshipRef,
    properties: &PropertyBag,
) -> Result<Statement> {
    validate_ref(rel)?;
    ident::properties(properties.keys())?;
    Ok(Statement::new(format!(
        "MATCH (a:{l1} {{ id: $node1_id }}), (b:{l2} {{ id: $node2_id }}) \
         MERGE (a)-[r:{ty}]->(b) \
         ON CREATE SET r += $props ON MATCH SET r += $props \
         RETURN count(r) AS updatedCount",
        l1 = rel.label1,
        l2 = rel.label2,
        ty = rel.rel_type,
    ))
    .param("node1_id", coerce_key(&rel.node1_id))
    .param("node2_id", coerce_key(&rel.node2_id))
    .param("props", GraphValue::Map(properties.clone()))
    .returning("updatedCount", ColumnKind::Count))
}

/// Applies a property bag to every relationship of a type.
pub fn update_relationships_by_type(
    rel_type: &str,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<Statement> {
    ident::relationship_type(rel_type)?;
    let bag = raw_bag(properties)?;
    Ok(Statement::new(format!(
        "MATCH ()-[r:{rel_type}]->() SET r += $props RETURN count(r) AS updatedCount"
    ))
    .param("props", GraphValue::Map(bag))
    .returning("updatedCount", ColumnKind::Count))
}

/// Single directed relationship property removal, returning the
/// surviving relationship.
pub fn remove_relationship_properties(
    rel: &RelationshipRef,
    properties: &[String],
) -> Result<Statement> {
    validate_ref(rel)?;
    let clause = remove_clause("r", properties)?;
    Ok(Statement::new(format!(
        "MATCH (a:{l1} {{ id: $node1_id }})-[r:{ty}]->(b:{l2} {{ id: $node2_id }}) \
         REMOVE {clause} RETURN elementId(r) AS rel_id, r AS rel",
        l1 = rel.label1,
        l2 = rel.label2,
        ty = rel.rel_type,
    ))
    .param("node1_id", coerce_key(&rel.node1_id))
    .param("node2_id", coerce_key(&rel.node2_id))
    .returning("rel_id", ColumnKind::Text)
    .returning("rel", ColumnKind::Relationship))
}

/// Bulk-item property removal over an anchored relationship match.
pub fn remove_relationship_properties_counted(
    rel: &RelationshipRef,
    properties: &[String],
) -> Result<Statement> {
    validate_ref(rel)?;
    let clause = remove_clause("r", properties)?;
    Ok(Statement::new(format!(
        "MATCH (a:{l1} {{ id: $node1_id }}), (b:{l2} {{ id: $node2_id }}) \
         MATCH (a)-[r:{ty}]->(b) REMOVE {clause} \
         RETURN count(r) AS updatedCount",
        l1 = rel.label1,
        l2 = rel.label2,
        ty = rel.rel_type,
    ))
    .param("node1_id", coerce_key(&rel.node1_id))
    .param("node2_id", coerce_key(&rel.node2_id))
    .returning("updatedCount", ColumnKind::Count))
}

/// Removes properties from every relationship of a type.
pub fn remove_relationships_by_type(rel_type: &str, properties: &[String]) -> Result<Statement> {
    ident::relationship_type(rel_type)?;
    let clause = remove_clause("r", properties)?;
    Ok(Statement::new(format!(
        "MATCH ()-[r:{rel_type}]->() REMOVE {clause} RETURN count(r) AS updatedCount"
    ))
    .returning("updatedCount", ColumnKind::Count))
}

/// Bulk-item relationship delete over an anchored match.
pub fn delete_relationship(rel: &RelationshipRef) -> Result<Statement> {
    validate_ref(rel)?;
    Ok(Statement::new(format!(
        "MATCH (a:{l1} {{ id: $node1_id }}), (b:{l2} {{ id: $node2_id }}) \
         MATCH (a)-[r:{ty}]->(b) DELETE r \
         RETURN count(r) AS deletedCount",
        l1 = rel.label1,
        l2 = rel.label2,
        ty = rel.rel_type,
    ))
    .param("node1_id", coerce_key(&rel.node1_id))
    .param("node2_id", coerce_key(&rel.node2_id))
    .returning("deletedCount", ColumnKind::Count))
}

fn validate_ref(rel: &RelationshipRef) -> Result<()> {
    ident::label(&rel.label1)?;
    ident::label(&rel.label2)?;
    ident::relationship_type(&rel.rel_type)
}

/// Builds a `REMOVE` clause body for the given variable, validating each
/// property name. At least one property is required.
fn remove_clause(var: &str, properties: &[String]) -> Result<String> {
    if properties.is_empty() {
        return Err(RedifyError::validation(
            "at least one property name is required for removal",
        ));
    }
    ident::properties(properties)?;
    Ok(properties
        .iter()
        .map(|p| format!("{var}.{p}"))
        .collect::<Vec<_>>()
        .join(", "))
}

/// Structural JSON → bag conversion with validated keys.
fn raw_bag(properties: &serde_json::Map<String, JsonValue>) -> Result<PropertyBag> {
    ident::properties(properties.keys())?;
    Ok(properties
        .iter()
        .map(|(k, v)| (k.clone(), GraphValue::from(v)))
        .collect())
}

/// JSON → bag conversion through the coercion engine (single-item
/// updates take externally-typed scalars).
fn coerced_bag(properties: &serde_json::Map<String, JsonValue>) -> Result<PropertyBag> {
    ident::properties(properties.keys())?;
    Ok(properties
        .iter()
        .map(|(k, v)| (k.clone(), coerce_property(k, v)))
        .collect())
}
