//! Restricted identifier grammar for names that reach query text.
//!
//! Labels, relationship types, and property names cannot travel as query
//! parameters; they are spliced into the statement text. Every such name
//! must therefore match a closed grammar — ASCII letters, digits, and
//! underscores, not starting with a digit — before the builder will touch
//! it. This keeps user-controlled text out of clause position entirely.

use crate::error::{RedifyError, Result};

/// Validates a name against the closed identifier grammar.
///
/// `what` names the identifier kind for the error message ("label",
/// "relationship type", "property name").
pub fn validate(what: &'static str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(RedifyError::InvalidIdentifier {
            what,
            value: name.to_owned(),
        })
    }
}

/// Validates a label name.
pub fn label(name: &str) -> Result<()> {
    validate("label", name)
}

/// Validates every label in a list.
pub fn labels(names: &[String]) -> Result<()> {
    for name in names {
        label(name)?;
    }
    Ok(())
}

/// Validates a relationship type name.
pub fn relationship_type(name: &str) -> Result<()> {
    validate("relationship type", name)
}

/// Validates a property name.
pub fn property(name: &str) -> Result<()> {
    validate("property name", name)
}

/// Validates every property name in an iterator of names.
pub fn properties<'a, I>(names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    for name in names {
        property(name)?;
    }
    Ok(())
}
