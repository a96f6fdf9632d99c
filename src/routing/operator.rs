//! Comparison operator algebra
//!
//! Operators handed to a key-to-tail mapper always read as `key <op> value`.
//! When the sharding key sits on the right-hand side of a comparison the
//! operator is mirrored; when a comparison sits under `NOT` it is negated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operator understood by key-to-tail mappers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardingOperator {
    /// key = value
    Equal,
    /// key != value
    NotEqual,
    /// key < value
    LessThan,
    /// key <= value
    LessThanOrEqual,
    /// key > value
    GreaterThan,
    /// key >= value
    GreaterThanOrEqual,
    /// Anything else (arithmetic, LIKE, bitwise, ...)
    Unknown,
}

impl ShardingOperator {
    /// All operators, in declaration order
    pub const ALL: [ShardingOperator; 7] = [
        ShardingOperator::Equal,
        ShardingOperator::NotEqual,
        ShardingOperator::LessThan,
        ShardingOperator::LessThanOrEqual,
        ShardingOperator::GreaterThan,
        ShardingOperator::GreaterThanOrEqual,
        ShardingOperator::Unknown,
    ];

    /// Swaps operand order: `value <op> key` becomes `key <mirror(op)> value`.
    pub fn mirror(self) -> Self {
        match self {
            ShardingOperator::LessThan => ShardingOperator::GreaterThan,
            ShardingOperator::LessThanOrEqual => ShardingOperator::GreaterThanOrEqual,
            ShardingOperator::GreaterThan => ShardingOperator::LessThan,
            ShardingOperator::GreaterThanOrEqual => ShardingOperator::LessThanOrEqual,
            op => op,
        }
    }

    /// Logical complement: `NOT (key <op> v)` is `key <negate(op)> v`.
    pub fn negate(self) -> Self {
        match self {
            ShardingOperator::Equal => ShardingOperator::NotEqual,
            ShardingOperator::NotEqual => ShardingOperator::Equal,
            ShardingOperator::LessThan => ShardingOperator::GreaterThanOrEqual,
            ShardingOperator::LessThanOrEqual => ShardingOperator::GreaterThan,
            ShardingOperator::GreaterThan => ShardingOperator::LessThanOrEqual,
            ShardingOperator::GreaterThanOrEqual => ShardingOperator::LessThan,
            ShardingOperator::Unknown => ShardingOperator::Unknown,
        }
    }

    /// Orients the operator so that it reads `key <op> value`.
    pub fn oriented(self, key_on_left: bool) -> Self {
        if key_on_left {
            self
        } else {
            self.mirror()
        }
    }

    /// Returns true if a mapper can act on this operator
    pub fn is_known(self) -> bool {
        self != ShardingOperator::Unknown
    }

    /// Returns the operator symbol for explain output
    pub fn symbol(self) -> &'static str {
        match self {
            ShardingOperator::Equal => "=",
            ShardingOperator::NotEqual => "!=",
            ShardingOperator::LessThan => "<",
            ShardingOperator::LessThanOrEqual => "<=",
            ShardingOperator::GreaterThan => ">",
            ShardingOperator::GreaterThanOrEqual => ">=",
            ShardingOperator::Unknown => "?",
        }
    }
}

impl fmt::Display for ShardingOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
