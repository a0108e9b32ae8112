//! Declarative-to-Cypher translation.
//!
//! This module turns structured requests into complete parameterized
//! statements. It never talks to the engine: the output of every function
//! here is a [`Statement`] that the session layer executes.

/// Filter/operator compilation into predicate fragments and parameters.
pub mod filter;

/// Statement assembly, one constructor per operation kind.
pub mod builder;

/// Parameterized statement representation with its result column layout.
pub mod statement;

pub use filter::{CompiledFilter, FilterItem, FilterSpec, Operator};
pub use statement::{ColumnKind, ReturnColumn, Statement};
