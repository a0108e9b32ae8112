//! Session boundary to the external graph engine.
//!
//! The engine contract is small: run one parameterized statement and get
//! back a stream of rows, or at most one row. [`GraphSession`] captures
//! exactly that, so executors can run against a scripted in-memory
//! session in tests and against the Bolt driver in production.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{RedifyError, Result};
use crate::query::Statement;
use crate::value::GraphValue;

/// Bolt-backed implementation.
pub mod neo4j;

pub use neo4j::Neo4jSession;

/// One decoded result row, keyed by RETURN alias.
pub type Row = BTreeMap<String, GraphValue>;

/// Transactional access to the graph engine.
///
/// Implementations must be safe for concurrent use: one session object is
/// shared process-wide and every request runs its statements through it.
#[async_trait]
pub trait GraphSession: Send + Sync {
    /// Runs a statement, discarding any result rows.
    async fn run(&self, statement: &Statement) -> Result<()>;

    /// Runs a statement and returns its first row, if any.
    async fn fetch_one(&self, statement: &Statement) -> Result<Option<Row>>;

    /// Runs a statement and returns all rows.
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>>;
}

/// Reads an integer column (counts) out of a row.
pub fn count_column(row: &Row, alias: &str) -> Result<i64> {
    row.get(alias)
        .and_then(GraphValue::as_int)
        .ok_or_else(|| RedifyError::Decode(format!("missing integer column '{alias}'")))
}

/// Reads a text column (element ids) out of a row.
pub fn text_column(row: &Row, alias: &str) -> Result<String> {
    row.get(alias)
        .and_then(|v| v.as_text().map(str::to_owned))
        .ok_or_else(|| RedifyError::Decode(format!("missing text column '{alias}'")))
}

/// Reads a list-of-strings column (labels) out of a row.
pub fn text_list_column(row: &Row, alias: &str) -> Result<Vec<String>> {
    match row.get(alias) {
        Some(GraphValue::List(items)) => Ok(items
            .iter()
            .filter_map(|v| v.as_text().map(str::to_owned))
            .collect()),
        _ => Err(RedifyError::Decode(format!(
            "missing list column '{alias}'"
        ))),
    }
}

/// Reads a property-bag column (nodes, relationships) out of a row.
pub fn bag_column(row: &Row, alias: &str) -> Result<crate::value::PropertyBag> {
    match row.get(alias) {
        Some(GraphValue::Map(bag)) => Ok(bag.clone()),
        _ => Err(RedifyError::Decode(format!("missing map column '{alias}'"))),
    }
}
