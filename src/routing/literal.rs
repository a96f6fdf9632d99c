//! Literal extraction
//!
//! Only three shapes are evaluated: plain constants, member paths rooted in a
//! closed-over value, and deferred self-contained closures. Live operands and
//! property references are never evaluated; they come back as
//! [`Literal::Unresolvable`]. A failure inside an evaluated shape (missing
//! member, null dereference, closure error) is returned as a [`LiteralError`]
//! and is fatal for the resolution.

use serde_json::Value;

use super::ast::{CollectionExpr, Operand};
use super::errors::LiteralError;

/// Outcome of extracting a literal from an operand
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Concrete host value (may be `null`)
    Value(Value),
    /// Outside the literal grammar
    Unresolvable,
}

impl Literal {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Literal::Value(v) => Some(v),
            Literal::Unresolvable => None,
        }
    }
}

/// Extracts the literal value of an operand
pub fn extract(operand: &Operand) -> Result<Literal, LiteralError> {
    match operand {
        Operand::Constant { value } => Ok(Literal::Value(value.clone())),
        Operand::Captured { root, path } => walk_path(root, path).map(Literal::Value),
        Operand::Deferred(deferred) => deferred.evaluate().map(Literal::Value),
        Operand::Property(_) | Operand::Live { .. } => Ok(Literal::Unresolvable),
    }
}

/// Materialises a membership collection into a finite sequence.
///
/// Returns `Ok(None)` when the collection is live, null, or not an array.
pub fn materialize(collection: &CollectionExpr) -> Result<Option<Vec<Value>>, LiteralError> {
    let value = match collection {
        CollectionExpr::Items { items } => return Ok(Some(items.clone())),
        CollectionExpr::Captured { root, path } => walk_path(root, path)?,
        CollectionExpr::Deferred(deferred) => deferred.evaluate()?,
        CollectionExpr::Live { .. } => return Ok(None),
    };

    match value {
        Value::Array(items) => Ok(Some(items)),
        _ => Ok(None),
    }
}

/// Follows a member path through a captured value.
///
/// Object segments are member names; array segments are decimal indexes.
fn walk_path(root: &Value, path: &[String]) -> Result<Value, LiteralError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        let member = || path[..=depth].join(".");
        current = match current {
            Value::Object(map) => map
                .get(segment)
                .ok_or_else(|| LiteralError::dereference(member(), "no such member"))?,
            Value::Array(items) => {
                let index: usize = segment
                    .parse()
                    .map_err(|_| LiteralError::dereference(member(), "array index expected"))?;
                items
                    .get(index)
                    .ok_or_else(|| LiteralError::dereference(member(), "index out of range"))?
            }
            Value::Null => return Err(LiteralError::dereference(member(), "null reference")),
            _ => return Err(LiteralError::dereference(member(), "not a container")),
        };
    }
    Ok(current.clone())
}
