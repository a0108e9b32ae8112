//! Crate-wide error taxonomy.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RedifyError>;

/// Error taxonomy for the gateway.
///
/// The variants map one-to-one onto HTTP status classes in the server
/// layer: validation failures never reach the query layer (400),
/// not-found covers absent targets of single-item operations (404),
/// `HasRelationships` is the delete precondition violation (409), and
/// engine/decode failures surface as internal errors (500).
#[derive(Debug, Error)]
pub enum RedifyError {
    /// Malformed or underspecified request, rejected before any query
    /// text is assembled.
    #[error("{0}")]
    Validation(String),

    /// A label, relationship type, or property name fell outside the
    /// restricted identifier grammar.
    #[error("invalid {what} '{value}': identifiers are letters, digits and underscores and must not start with a digit")]
    InvalidIdentifier {
        /// What kind of name was rejected ("label", "relationship type",
        /// "property name").
        what: &'static str,
        /// The offending input.
        value: String,
    },

    /// The targeted node or relationship does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A node delete was blocked because the node still has incident
    /// relationships.
    #[error("node with id {key} (label {label}) cannot be deleted: {count} incident relationship(s)")]
    HasRelationships {
        /// Node label.
        label: String,
        /// Business key (`id` property) of the node.
        key: String,
        /// Incident relationship count reported by the guard query.
        count: u64,
    },

    /// The graph engine rejected a statement or the connection failed.
    #[error("graph engine error: {0}")]
    Engine(#[from] neo4rs::Error),

    /// A result row did not decode into the expected column layout.
    #[error("failed to decode result row: {0}")]
    Decode(String),
}

impl RedifyError {
    /// Convenience constructor for validation failures.
    pub fn validation(message: impl Into<String>) -> Self {
        RedifyError::Validation(message.into())
    }

    /// Convenience constructor for not-found outcomes.
    pub fn not_found(message: impl Into<String>) -> Self {
        RedifyError::NotFound(message.into())
    }
}
