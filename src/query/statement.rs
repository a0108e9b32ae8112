//! Parameterized statement with a declared result layout.

use std::collections::BTreeMap;
use std::fmt;

use crate::value::GraphValue;

/// How a RETURN column should be decoded by the session layer.
///
/// Every statement the builder produces declares its columns up front, so
/// row decoding never guesses: the engine driver is asked for exactly the
/// type each alias carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `count(..)`-style aggregate; always an integer, present even over
    /// an empty match.
    Count,
    /// Numeric aggregate that may be an integer, a float, or null.
    Number,
    /// String column (element ids).
    Text,
    /// List-of-strings column (`labels(n)`).
    TextList,
    /// Whole node; decoded into its property bag.
    Node,
    /// Whole relationship; decoded into its property bag.
    Relationship,
}

/// One declared RETURN column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnColumn {
    /// The RETURN alias, always a fixed name chosen by the builder.
    pub alias: &'static str,
    /// Decoding rule for the column.
    pub kind: ColumnKind,
}

impl ReturnColumn {
    /// Shorthand constructor.
    pub const fn new(alias: &'static str, kind: ColumnKind) -> Self {
        Self { alias, kind }
    }
}

/// A complete statement: query text, parameter map, result layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: BTreeMap<String, GraphValue>,
    returns: Vec<ReturnColumn>,
}

impl Statement {
    /// Creates a statement with no parameters and no declared columns.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
            returns: Vec::new(),
        }
    }

    /// Adds one parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Adds a whole parameter map.
    pub fn params(mut self, params: BTreeMap<String, GraphValue>) -> Self {
        self.params.extend(params);
        self
    }

    /// Declares one RETURN column.
    pub fn returning(mut self, alias: &'static str, kind: ColumnKind) -> Self {
        self.returns.push(ReturnColumn::new(alias, kind));
        self
    }

    /// The Cypher text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parameter map.
    pub fn parameters(&self) -> &BTreeMap<String, GraphValue> {
        &self.params
    }

    /// The declared result layout.
    pub fn returns(&self) -> &[ReturnColumn] {
        &self.returns
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
