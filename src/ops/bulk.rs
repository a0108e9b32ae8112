//! Batch execution with per-item accounting.
//!
//! Items run sequentially in the same session; an item's failure never
//! halts the loop, and outcomes accumulate in input order so error
//! reports are deterministic.

use serde::Serialize;

use crate::engine::{count_column, GraphSession};
use crate::error::Result;
use crate::query::Statement;

/// Tagged outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The item matched and its mutation applied to `count` targets.
    Applied {
        /// Affected-row count reported by the engine.
        count: u64,
    },
    /// The item's target did not exist (affected count was zero).
    NotFound {
        /// Message naming the item's identifying fields.
        detail: String,
    },
    /// A precondition blocked the item (delete-with-checks only).
    Blocked {
        /// Message naming the item and the violated precondition.
        detail: String,
    },
    /// Building or executing the item's statement failed.
    Failed {
        /// The underlying error, prefixed with the item identification.
        detail: String,
    },
}

impl BatchOutcome {
    /// The error message carried by a non-applied outcome.
    pub fn error(&self) -> Option<&str> {
        match self {
            BatchOutcome::Applied { .. } => None,
            BatchOutcome::NotFound { detail }
            | BatchOutcome::Blocked { detail }
            | BatchOutcome::Failed { detail } => Some(detail),
        }
    }
}

/// Accumulated batch result.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BulkReport {
    outcomes: Vec<BatchOutcome>,
}

impl BulkReport {
    /// Appends one outcome.
    pub fn push(&mut self, outcome: BatchOutcome) {
        self.outcomes.push(outcome);
    }

    /// Per-item outcomes in input order.
    pub fn outcomes(&self) -> &[BatchOutcome] {
        &self.outcomes
    }

    /// Total affected-row count across applied items.
    pub fn applied_count(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                BatchOutcome::Applied { count } => *count,
                _ => 0,
            })
            .sum()
    }

    /// Error messages of the non-applied items, in input order.
    pub fn error_messages(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error().map(str::to_owned))
            .collect()
    }
}

/// One prepared batch item. A build failure is carried instead of a
/// statement and surfaces as a `Failed` outcome without executing,
/// keeping sibling items unaffected.
pub struct BatchItem {
    /// Human-readable identification used in outcome messages.
    pub describe: String,
    /// RETURN alias carrying the affected-row count.
    pub count_alias: &'static str,
    /// The statement, or the error that prevented building it.
    pub statement: Result<Statement>,
}

/// Runs every item and accumulates outcomes. Never returns early: an
/// engine error on one item records a `Failed` outcome and the loop
/// continues with the next item.
pub async fn execute_batch(session: &dyn GraphSession, items: Vec<BatchItem>) -> BulkReport {
    let mut report = BulkReport::default();
    for item in items {
        let outcome = run_item(session, &item).await;
        if let Some(error) = outcome.error() {
            tracing::warn!(item = %item.describe, %error, "batch item did not apply");
        }
        report.push(outcome);
    }
    report
}

async fn run_item(session: &dyn GraphSession, item: &BatchItem) -> BatchOutcome {
    let statement = match &item.statement {
        Ok(statement) => statement,
        Err(err) => {
            return BatchOutcome::Failed {
                detail: format!("{}: {err}", item.describe),
            }
        }
    };
    match session.fetch_one(statement).await {
        Ok(Some(row)) => match count_column(&row, item.count_alias) {
            Ok(0) => BatchOutcome::NotFound {
                detail: format!("{} not found", item.describe),
            },
            Ok(count) => BatchOutcome::Applied {
                count: count as u64,
            },
            Err(err) => BatchOutcome::Failed {
                detail: format!("{}: {err}", item.describe),
            },
        },
        Ok(None) => BatchOutcome::Failed {
            detail: format!("{}: engine returned no result row", item.describe),
        },
        Err(err) => BatchOutcome::Failed {
            detail: format!("{}: {err}", item.describe),
        },
    }
}
