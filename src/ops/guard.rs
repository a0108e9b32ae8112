//! Pre-delete check: does the node exist, and does anything still point
//! at it?

use crate::engine::{count_column, GraphSession};
use crate::error::Result;
use crate::query::builder;
use crate::value::GraphValue;

/// Outcome of the existence/relationship check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteCheck {
    /// Node exists and has no incident relationships.
    Deletable,
    /// Node does not exist.
    Missing,
    /// Node exists but still has incident relationships; deleting it is
    /// blocked.
    HasRelationships {
        /// Incident relationship count.
        count: u64,
    },
}

/// Runs the check in a single round trip. The statement's
/// `OPTIONAL MATCH` keeps the base row alive when the node has no
/// relationships, so existence and relationship count arrive together.
pub async fn check_node(
    session: &dyn GraphSession,
    label: &str,
    key: &GraphValue,
) -> Result<DeleteCheck> {
    let statement = builder::node_delete_check_keyed(label, key.clone())?;
    match session.fetch_one(&statement).await? {
        None => Ok(DeleteCheck::Missing),
        Some(row) => {
            let count = count_column(&row, "rel_count")?;
            if count == 0 {
                Ok(DeleteCheck::Deletable)
            } else {
                Ok(DeleteCheck::HasRelationships {
                    count: count as u64,
                })
            }
        }
    }
}
