//! Route resolution result handed to the dispatcher

use serde::Serialize;

use super::ast::ShardingKeyKind;
use super::errors::{RouteError, RouteResult};
use super::predicate::TailPredicate;
use crate::observability::{log_event, Event};

/// Resolved routing for one entity and one key kind
#[derive(Debug, Clone)]
pub struct RouteResolution {
    entity: String,
    kind: ShardingKeyKind,
    predicate: TailPredicate,
}

impl RouteResolution {
    pub fn new(entity: impl Into<String>, kind: ShardingKeyKind, predicate: TailPredicate) -> Self {
        Self {
            entity: entity.into(),
            kind,
            predicate,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn kind(&self) -> ShardingKeyKind {
        self.kind
    }

    pub fn predicate(&self) -> &TailPredicate {
        &self.predicate
    }

    pub fn into_predicate(self) -> TailPredicate {
        self.predicate
    }

    /// True when nothing could be narrowed
    pub fn is_full_scan(&self) -> bool {
        self.predicate.is_always()
    }

    /// Tails from the known universe that must be queried
    pub fn matching_tails<'t, I>(&self, tails: I) -> Vec<&'t str>
    where
        I: IntoIterator<Item = &'t str>,
    {
        self.predicate.filter_tails(tails)
    }

    /// Like [`matching_tails`](Self::matching_tails) but fails when nothing
    /// survives, for operations that must land on at least one tail.
    pub fn require_match<'t, I>(&self, tails: I) -> RouteResult<Vec<&'t str>>
    where
        I: IntoIterator<Item = &'t str>,
    {
        let matched = self.matching_tails(tails);
        if matched.is_empty() {
            log_event(
                Event::RouteNotMatched,
                &[("entity", self.entity.as_str()), ("key", self.kind.as_str())],
            );
            return Err(RouteError::RouteNotMatch {
                entity: self.entity.clone(),
                kind: self.kind,
            });
        }
        Ok(matched)
    }

    /// Serializable description for explain output
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            entity: self.entity.clone(),
            key: self.kind,
            full_scan: self.is_full_scan(),
            predicate: self.predicate.to_string(),
        }
    }
}

/// Explain view of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub entity: String,
    pub key: ShardingKeyKind,
    pub full_scan: bool,
    pub predicate: String,
}
