//! Relationship operation executors.

use serde_json::Value as JsonValue;

use crate::engine::{bag_column, count_column, text_column, GraphSession, Row};
use crate::error::{RedifyError, Result};
use crate::model::{
    RelationshipRecord, RelationshipRef, RelationshipRemoveItem, RelationshipUpdateItem,
};
use crate::ops::bulk::{self, BatchItem, BulkReport};
use crate::query::builder;

/// Creates a directed relationship between two existing nodes, with at
/// least three properties. If either endpoint is absent the statement
/// matches nothing and nothing is created.
pub async fn create_relationship(
    session: &dyn GraphSession,
    rel: &RelationshipRef,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<RelationshipRecord> {
    let statement = builder::create_relationship(rel, properties)?;
    match session.fetch_one(&statement).await? {
        Some(row) => record_from(&row),
        None => Err(RedifyError::not_found(format!(
            "could not create {}: one or both endpoint nodes do not exist",
            rel.describe()
        ))),
    }
}

/// Merges a property bag into one directed relationship.
pub async fn update_relationship(
    session: &dyn GraphSession,
    rel: &RelationshipRef,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<RelationshipRecord> {
    let statement = builder::update_relationship(rel, properties)?;
    match session.fetch_one(&statement).await? {
        Some(row) => record_from(&row),
        None => Err(rel_not_found(rel)),
    }
}

/// Merges a property bag into every relationship of a type. Returns the
/// matched-relationship count.
pub async fn update_relationships_by_type(
    session: &dyn GraphSession,
    rel_type: &str,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<u64> {
    let statement = builder::update_relationships_by_type(rel_type, properties)?;
    let row = expect_row(session.fetch_one(&statement).await?)?;
    Ok(count_column(&row, "updatedCount")? as u64)
}

/// Removes named properties from one directed relationship.
pub async fn remove_relationship_properties(
    session: &dyn GraphSession,
    rel: &RelationshipRef,
    properties: &[String],
) -> Result<RelationshipRecord> {
    let statement = builder::remove_relationship_properties(rel, properties)?;
    match session.fetch_one(&statement).await? {
        Some(row) => record_from(&row),
        None => Err(rel_not_found(rel)),
    }
}

/// Removes named properties from every relationship of a type.
pub async fn remove_relationships_by_type(
    session: &dyn GraphSession,
    rel_type: &str,
    properties: &[String],
) -> Result<u64> {
    let statement = builder::remove_relationships_by_type(rel_type, properties)?;
    let row = expect_row(session.fetch_one(&statement).await?)?;
    Ok(count_column(&row, "updatedCount")? as u64)
}

/// Upserts a batch of relationships, one statement per item, with
/// per-item accounting.
pub async fn update_relationships_bulk(
    session: &dyn GraphSession,
    items: &[RelationshipUpdateItem],
) -> BulkReport {
    let prepared = items
        .iter()
        .map(|item| BatchItem {
            describe: item.rel.describe(),
            count_alias: "updatedCount",
            statement: builder::upsert_relationship(&item.rel, &item.property_bag()),
        })
        .collect();
    bulk::execute_batch(session, prepared).await
}

/// Removes properties from a batch of relationships with per-item
/// accounting.
pub async fn remove_relationships_bulk(
    session: &dyn GraphSession,
    items: &[RelationshipRemoveItem],
) -> BulkReport {
    let prepared = items
        .iter()
        .map(|item| BatchItem {
            describe: item.rel.describe(),
            count_alias: "updatedCount",
            statement: builder::remove_relationship_properties_counted(
                &item.rel,
                &item.properties,
            ),
        })
        .collect();
    bulk::execute_batch(session, prepared).await
}

/// Deletes a batch of relationships with per-item accounting.
pub async fn delete_relationships_bulk(
    session: &dyn GraphSession,
    rels: &[RelationshipRef],
) -> BulkReport {
    let prepared = rels
        .iter()
        .map(|rel| BatchItem {
            describe: rel.describe(),
            count_alias: "deletedCount",
            statement: builder::delete_relationship(rel),
        })
        .collect();
    bulk::execute_batch(session, prepared).await
}

fn rel_not_found(rel: &RelationshipRef) -> RedifyError {
    RedifyError::not_found(format!("{} not found", rel.describe()))
}

fn expect_row(row: Option<Row>) -> Result<Row> {
    row.ok_or_else(|| RedifyError::Decode("statement returned no result row".into()))
}

fn record_from(row: &Row) -> Result<RelationshipRecord> {
    Ok(RelationshipRecord {
        id: text_column(row, "rel_id")?,
        properties: bag_column(row, "rel")?,
    })
}
