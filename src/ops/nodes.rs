//! Node operation executors.

use serde_json::Value as JsonValue;

use crate::coerce::coerce_key_list;
use crate::engine::{bag_column, count_column, text_column, text_list_column, GraphSession, Row};
use crate::error::{RedifyError, Result};
use crate::model::{AggregateReport, CreatedNode, NodeRecord};
use crate::ops::bulk::{BatchOutcome, BulkReport};
use crate::ops::guard::{self, DeleteCheck};
use crate::query::builder;
use crate::query::filter::FilterSpec;
use crate::value::GraphValue;

/// Creates a node carrying one label.
pub async fn create_node(session: &dyn GraphSession, label: &str) -> Result<CreatedNode> {
    let statement = builder::create_node(label)?;
    let row = expect_row(session.fetch_one(&statement).await?, "node creation")?;
    created_from(&row)
}

/// Creates a node carrying at least two labels.
pub async fn create_node_multi(
    session: &dyn GraphSession,
    labels: &[String],
) -> Result<CreatedNode> {
    let statement = builder::create_node_multi(labels)?;
    let row = expect_row(session.fetch_one(&statement).await?, "node creation")?;
    created_from(&row)
}

/// Creates a node with a label and at least five properties.
pub async fn create_node_with_properties(
    session: &dyn GraphSession,
    label: &str,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<NodeRecord> {
    let statement = builder::create_node_with_properties(label, properties)?;
    let row = expect_row(session.fetch_one(&statement).await?, "node creation")?;
    record_from(&row)
}

/// Fetches one node by label and business key.
pub async fn get_node(session: &dyn GraphSession, label: &str, key: &str) -> Result<NodeRecord> {
    let statement = builder::get_node(label, key)?;
    match session.fetch_one(&statement).await? {
        Some(row) => record_from(&row),
        None => Err(node_not_found(label, key)),
    }
}

/// Label-scoped filtered search, capped by `limit` (default 100).
pub async fn search_nodes(
    session: &dyn GraphSession,
    labels: &[String],
    filters: &FilterSpec,
    limit: Option<i64>,
) -> Result<Vec<NodeRecord>> {
    let statement = builder::search_nodes(labels, filters, limit)?;
    let rows = session.fetch_all(&statement).await?;
    rows.iter().map(record_from).collect()
}

/// Count/avg/max/min/sum over one property of one label.
pub async fn aggregate_nodes(
    session: &dyn GraphSession,
    label: &str,
    property: &str,
) -> Result<AggregateReport> {
    let statement = builder::aggregate_nodes(label, property)?;
    let row = expect_row(session.fetch_one(&statement).await?, "aggregation")?;
    Ok(AggregateReport {
        count: count_column(&row, "count")?,
        avg: aggregate_column(&row, "avg"),
        max: aggregate_column(&row, "max"),
        min: aggregate_column(&row, "min"),
        sum: aggregate_column(&row, "sum"),
    })
}

/// Merges a property bag into one node (values run through coercion).
pub async fn update_node_properties(
    session: &dyn GraphSession,
    label: &str,
    key: &str,
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<NodeRecord> {
    let statement = builder::update_node_properties(label, key, properties)?;
    match session.fetch_one(&statement).await? {
        Some(row) => record_from(&row),
        None => Err(node_not_found(label, key)),
    }
}

/// Merges a property bag into every node whose key is in the list.
/// Returns the matched-node count.
pub async fn update_nodes_properties(
    session: &dyn GraphSession,
    label: &str,
    keys: &[String],
    properties: &serde_json::Map<String, JsonValue>,
) -> Result<u64> {
    let statement = builder::update_nodes_properties(label, keys, properties)?;
    let row = expect_row(session.fetch_one(&statement).await?, "bulk update")?;
    Ok(count_column(&row, "updatedCount")? as u64)
}

/// Removes named properties from one node.
pub async fn remove_node_properties(
    session: &dyn GraphSession,
    label: &str,
    key: &str,
    properties: &[String],
) -> Result<NodeRecord> {
    let statement = builder::remove_node_properties(label, key, properties)?;
    match session.fetch_one(&statement).await? {
        Some(row) => record_from(&row),
        None => Err(node_not_found(label, key)),
    }
}

/// Removes named properties from every node whose key is in the list.
/// Counts matched nodes; removing an absent property is a no-op.
pub async fn remove_nodes_properties(
    session: &dyn GraphSession,
    label: &str,
    keys: &[String],
    properties: &[String],
) -> Result<u64> {
    let statement = builder::remove_nodes_properties(label, keys, properties)?;
    let row = expect_row(session.fetch_one(&statement).await?, "bulk removal")?;
    Ok(count_column(&row, "updatedCount")? as u64)
}

/// Deletes one node after the guard confirms it exists and has no
/// incident relationships.
pub async fn delete_node(session: &dyn GraphSession, label: &str, key: &str) -> Result<()> {
    let keyed = crate::coerce::coerce_key(key);
    match guard::check_node(session, label, &keyed).await? {
        DeleteCheck::Missing => Err(node_not_found(label, key)),
        DeleteCheck::HasRelationships { count } => Err(RedifyError::HasRelationships {
            label: label.to_owned(),
            key: key.to_owned(),
            count,
        }),
        DeleteCheck::Deletable => {
            let statement = builder::delete_node_keyed(label, keyed)?;
            session.run(&statement).await
        }
    }
}

/// Deletes a list of nodes, consulting the guard per item. Outcomes
/// accumulate independently; a blocked or missing node never stops its
/// siblings.
pub async fn delete_nodes_with_checks(
    session: &dyn GraphSession,
    label: &str,
    keys: &[String],
) -> Result<BulkReport> {
    // Whole-list key coercion keeps the all-or-nothing typing rule.
    let typed_keys = match coerce_key_list(keys) {
        GraphValue::List(typed) => typed,
        other => vec![other],
    };

    let mut report = BulkReport::default();
    for (raw, key) in keys.iter().zip(typed_keys) {
        let outcome = delete_one_checked(session, label, raw, &key).await;
        if let Some(error) = outcome.error() {
            tracing::warn!(label, key = %raw, %error, "node not deleted");
        }
        report.push(outcome);
    }
    Ok(report)
}

/// Deletes every node of a label, relationships included. The explicitly
/// check-free variant.
pub async fn delete_nodes_by_label(session: &dyn GraphSession, label: &str) -> Result<u64> {
    let statement = builder::detach_delete_by_label(label)?;
    let row = expect_row(session.fetch_one(&statement).await?, "bulk delete")?;
    Ok(count_column(&row, "deletedCount")? as u64)
}

async fn delete_one_checked(
    session: &dyn GraphSession,
    label: &str,
    raw_key: &str,
    key: &GraphValue,
) -> BatchOutcome {
    match guard::check_node(session, label, key).await {
        Ok(DeleteCheck::Missing) => BatchOutcome::NotFound {
            detail: format!("node with id {raw_key} not found"),
        },
        Ok(DeleteCheck::HasRelationships { count }) => BatchOutcome::Blocked {
            detail: format!(
                "node with id {raw_key} cannot be deleted: {count} incident relationship(s)"
            ),
        },
        Ok(DeleteCheck::Deletable) => {
            let run = match builder::delete_node_keyed(label, key.clone()) {
                Ok(statement) => session.run(&statement).await,
                Err(err) => Err(err),
            };
            match run {
                Ok(()) => BatchOutcome::Applied { count: 1 },
                Err(err) => BatchOutcome::Failed {
                    detail: format!("node with id {raw_key}: {err}"),
                },
            }
        }
        Err(err) => BatchOutcome::Failed {
            detail: format!("node with id {raw_key}: {err}"),
        },
    }
}

fn node_not_found(label: &str, key: &str) -> RedifyError {
    RedifyError::not_found(format!("node with id {key} (label {label}) not found"))
}

fn expect_row(row: Option<Row>, what: &str) -> Result<Row> {
    row.ok_or_else(|| RedifyError::Decode(format!("{what} returned no result row")))
}

fn created_from(row: &Row) -> Result<CreatedNode> {
    Ok(CreatedNode {
        id: text_column(row, "node_id")?,
        labels: text_list_column(row, "labels")?,
    })
}

fn record_from(row: &Row) -> Result<NodeRecord> {
    Ok(NodeRecord {
        id: text_column(row, "node_id")?,
        labels: text_list_column(row, "labels")?,
        properties: bag_column(row, "node")?,
    })
}

fn aggregate_column(row: &Row, alias: &str) -> GraphValue {
    row.get(alias).cloned().unwrap_or(GraphValue::Null)
}
