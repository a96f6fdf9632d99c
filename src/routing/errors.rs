//! Routing error types
//!
//! Only two things can go wrong during routing:
//! - SHARD_ROUTE_LITERAL_FAILED: a recognised literal expression failed while
//!   being evaluated. Fatal for the resolution; the caller decides whether to
//!   fall back to all tails or abort.
//! - SHARD_ROUTE_NOT_MATCH: the caller required at least one tail and the
//!   resolved predicate admitted none.
//!
//! Everything else that stops the resolver from narrowing (unknown shapes,
//! live sub-queries, values outside the key domain) is not an error.

use thiserror::Error;

use super::ast::ShardingKeyKind;

/// Failure raised while evaluating a literal sub-expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("arithmetic fault: {0}")]
    Arithmetic(String),

    #[error("invalid dereference of '{member}': {reason}")]
    InvalidDereference { member: String, reason: String },

    #[error("evaluation failed: {0}")]
    Failed(String),
}

impl LiteralError {
    /// Shorthand for a dereference failure
    pub fn dereference(member: impl Into<String>, reason: impl Into<String>) -> Self {
        LiteralError::InvalidDereference {
            member: member.into(),
            reason: reason.into(),
        }
    }
}

/// Routing errors
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    #[error("literal evaluation failed for {entity}.{property}: {source}")]
    LiteralEvaluation {
        entity: String,
        property: String,
        #[source]
        source: LiteralError,
    },

    #[error("sharding key route not matched: {entity} ({kind} key)")]
    RouteNotMatch {
        entity: String,
        kind: ShardingKeyKind,
    },
}

impl RouteError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RouteError::LiteralEvaluation { .. } => "SHARD_ROUTE_LITERAL_FAILED",
            RouteError::RouteNotMatch { .. } => "SHARD_ROUTE_NOT_MATCH",
        }
    }

    /// Literal failures abort the whole resolution
    pub fn is_fatal(&self) -> bool {
        matches!(self, RouteError::LiteralEvaluation { .. })
    }
}

/// Result type for routing operations
pub type RouteResult<T> = Result<T, RouteError>;
