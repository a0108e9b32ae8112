//! Bolt-backed [`GraphSession`] over the `neo4rs` driver.
//!
//! The driver pools connections internally, so one `Neo4jSession` is the
//! process-wide session provider: created once at startup, shared via
//! `Arc`, dropped at shutdown.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use neo4rs::{BoltMap, BoltNull, BoltType, Graph};
use tracing::debug;

use crate::engine::{GraphSession, Row};
use crate::error::{RedifyError, Result};
use crate::query::{ColumnKind, ReturnColumn, Statement};
use crate::value::{GraphValue, PropertyBag};

/// Shared handle to a Bolt endpoint.
pub struct Neo4jSession {
    graph: Graph,
}

impl Neo4jSession {
    /// Connects to the engine. The handle is cheap to share; the driver
    /// manages its own connection pool behind it.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password).await?;
        Ok(Self { graph })
    }

    fn build_query(statement: &Statement) -> neo4rs::Query {
        let mut query = neo4rs::query(statement.text());
        for (name, value) in statement.parameters() {
            query = query.param(name, to_bolt(value));
        }
        query
    }
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn run(&self, statement: &Statement) -> Result<()> {
        debug!(query = %statement.text(), "running statement");
        self.graph.run(Self::build_query(statement)).await?;
        Ok(())
    }

    async fn fetch_one(&self, statement: &Statement) -> Result<Option<Row>> {
        debug!(query = %statement.text(), "fetching single row");
        let mut stream = self.graph.execute(Self::build_query(statement)).await?;
        match stream.next().await? {
            Some(row) => Ok(Some(decode_row(&row, statement.returns())?)),
            None => Ok(None),
        }
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>> {
        debug!(query = %statement.text(), "fetching rows");
        let mut stream = self.graph.execute(Self::build_query(statement)).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(decode_row(&row, statement.returns())?);
        }
        Ok(rows)
    }
}

/// Converts a parameter value into the driver's wire representation.
///
/// Lists are sent homogeneously typed when their elements agree; a
/// mixed-type list degrades to the elements' string forms (the engine
/// rejects heterogeneous property lists anyway).
fn to_bolt(value: &GraphValue) -> BoltType {
    match value {
        GraphValue::Null => BoltType::Null(BoltNull),
        GraphValue::Bool(v) => BoltType::from(*v),
        GraphValue::Int(v) => BoltType::from(*v),
        GraphValue::Float(v) => BoltType::from(*v),
        GraphValue::Text(v) => BoltType::from(v.as_str()),
        GraphValue::Date(v) => BoltType::Date((*v).into()),
        GraphValue::List(items) => list_to_bolt(items),
        GraphValue::Map(entries) => BoltType::Map(bag_to_bolt(entries)),
    }
}

fn bag_to_bolt(entries: &PropertyBag) -> BoltMap {
    let mut map = BoltMap::default();
    for (name, value) in entries {
        map.put(name.clone().into(), to_bolt(value));
    }
    map
}

fn list_to_bolt(items: &[GraphValue]) -> BoltType {
    if items.iter().all(|v| matches!(v, GraphValue::Int(_))) {
        let ints: Vec<i64> = items.iter().filter_map(GraphValue::as_int).collect();
        return BoltType::from(ints);
    }
    if items
        .iter()
        .all(|v| matches!(v, GraphValue::Int(_) | GraphValue::Float(_)))
    {
        let floats: Vec<f64> = items.iter().filter_map(GraphValue::as_number).collect();
        return BoltType::from(floats);
    }
    if items.iter().all(|v| matches!(v, GraphValue::Bool(_))) {
        let bools: Vec<bool> = items
            .iter()
            .map(|v| matches!(v, GraphValue::Bool(true)))
            .collect();
        return BoltType::from(bools);
    }
    let texts: Vec<String> = items.iter().map(GraphValue::to_operand_string).collect();
    BoltType::from(texts)
}

fn decode_row(row: &neo4rs::Row, returns: &[ReturnColumn]) -> Result<Row> {
    let mut decoded = Row::new();
    for column in returns {
        let value = decode_column(row, column)?;
        decoded.insert(column.alias.to_owned(), value);
    }
    Ok(decoded)
}

fn decode_column(row: &neo4rs::Row, column: &ReturnColumn) -> Result<GraphValue> {
    let alias = column.alias;
    match column.kind {
        ColumnKind::Count => row
            .get::<i64>(alias)
            .map(GraphValue::Int)
            .map_err(|err| decode_error(alias, &err)),
        ColumnKind::Number => {
            // Aggregates over an empty match come back null.
            if let Ok(v) = row.get::<i64>(alias) {
                Ok(GraphValue::Int(v))
            } else if let Ok(v) = row.get::<f64>(alias) {
                Ok(GraphValue::Float(v))
            } else {
                Ok(GraphValue::Null)
            }
        }
        ColumnKind::Text => row
            .get::<String>(alias)
            .map(GraphValue::Text)
            .map_err(|err| decode_error(alias, &err)),
        ColumnKind::TextList => row
            .get::<Vec<String>>(alias)
            .map(GraphValue::from)
            .map_err(|err| decode_error(alias, &err)),
        ColumnKind::Node => {
            let node: neo4rs::Node = row.get(alias).map_err(|err| decode_error(alias, &err))?;
            Ok(GraphValue::Map(node_properties(&node)))
        }
        ColumnKind::Relationship => {
            let rel: neo4rs::Relation = row.get(alias).map_err(|err| decode_error(alias, &err))?;
            Ok(GraphValue::Map(relation_properties(&rel)))
        }
    }
}

fn decode_error(alias: &str, err: &dyn std::fmt::Display) -> RedifyError {
    RedifyError::Decode(format!("column '{alias}': {err}"))
}

/// Common surface of driver nodes and relationships: enumerable keys
/// plus typed property extraction.
trait PropertySource {
    fn property_keys(&self) -> Vec<&str>;
    fn property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T>;
}

impl PropertySource for neo4rs::Node {
    fn property_keys(&self) -> Vec<&str> {
        self.keys()
    }

    fn property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).ok()
    }
}

impl PropertySource for neo4rs::Relation {
    fn property_keys(&self) -> Vec<&str> {
        self.keys()
    }

    fn property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).ok()
    }
}

/// Decodes a node's property bag.
pub(crate) fn node_properties(node: &neo4rs::Node) -> PropertyBag {
    properties_of(node)
}

/// Decodes a relationship's property bag.
pub(crate) fn relation_properties(rel: &neo4rs::Relation) -> PropertyBag {
    properties_of(rel)
}

fn properties_of(source: &impl PropertySource) -> PropertyBag {
    let mut bag = PropertyBag::new();
    for key in source.property_keys() {
        bag.insert(key.to_owned(), probe_property(source, key));
    }
    bag
}

/// Probes one property with a fixed type order. Integers come before
/// floats so whole numbers stay integers; dates come before strings so
/// typed temporal values survive instead of lexical renderings.
fn probe_property(source: &impl PropertySource, key: &str) -> GraphValue {
    if let Some(v) = source.property::<i64>(key) {
        return GraphValue::Int(v);
    }
    if let Some(v) = source.property::<f64>(key) {
        return GraphValue::Float(v);
    }
    if let Some(v) = source.property::<bool>(key) {
        return GraphValue::Bool(v);
    }
    if let Some(v) = source.property::<NaiveDate>(key) {
        return GraphValue::Date(v);
    }
    if let Some(v) = source.property::<NaiveDateTime>(key) {
        return GraphValue::Text(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Some(v) = source.property::<DateTime<FixedOffset>>(key) {
        return GraphValue::Text(v.to_rfc3339());
    }
    if let Some(v) = source.property::<String>(key) {
        return GraphValue::Text(v);
    }
    if let Some(v) = source.property::<Vec<String>>(key) {
        return GraphValue::from(v);
    }
    if let Some(v) = source.property::<Vec<i64>>(key) {
        return GraphValue::from(v);
    }
    if let Some(v) = source.property::<Vec<f64>>(key) {
        return GraphValue::List(v.into_iter().map(GraphValue::Float).collect());
    }
    GraphValue::Null
}
