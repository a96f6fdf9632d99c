//! Route resolver
//!
//! Folds a predicate tree into one tail predicate for a single sharding key
//! (table or datasource). The fold is sound: a tail is excluded only when no
//! row satisfying the filter can live in it.
//!
//! # Folding rules
//!
//! - `And` intersects, `Or` unions.
//! - `Not` is pushed down: De Morgan over `And`/`Or`, `Equal`/`NotEqual`
//!   swap over comparisons and equality calls, polarity flip over membership.
//!   A negated ordered comparison admits every tail, since a row with a null
//!   key satisfies `NOT (k < v)` without satisfying `k >= v`.
//! - Comparisons reach the mapper as `key <op> value`; a key on the right
//!   mirrors the operator.
//! - Positive membership is the union of `Equal` leaves, negated membership
//!   the intersection of `NotEqual` leaves.
//! - Anything else, including unknown operators, non-key properties, live
//!   operands and values outside the key domain, admits every tail.
//!
//! Only a failure while evaluating a recognised literal is an error, and it
//! is raised even when the surrounding comparison could not narrow anything.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ast::{
    CollectionExpr, EntityMetadata, Operand, PredicateNode, ShardingKey, ShardingKeyKind,
};
use super::errors::{LiteralError, RouteError, RouteResult};
use super::literal::{self, Literal};
use super::mapper::KeyToTailMapper;
use super::operator::ShardingOperator;
use super::predicate::TailPredicate;
use super::result::RouteResolution;
use super::value::ShardKeyValue;
use crate::observability::{log_event, Event, Logger, MetricsRegistry, Severity};

/// Default nesting limit for logical combinators
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How a zero/default literal (`0`, `false`, `0001-01-01T00:00:00Z`, nil guid) is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroValuePolicy {
    /// The literal counts as "no value"; the node admits every tail
    #[default]
    TreatAsAbsent,
    /// The literal is an ordinary key value
    TreatAsKey,
}

/// Resolver options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Deeper subtrees admit every tail
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub zero_values: ZeroValuePolicy,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            zero_values: ZeroValuePolicy::default(),
        }
    }
}

impl ResolveOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_zero_values(mut self, policy: ZeroValuePolicy) -> Self {
        self.zero_values = policy;
        self
    }
}

/// Resolves predicate trees for one entity and one key kind
pub struct RouteResolver<'a, M: KeyToTailMapper + ?Sized> {
    metadata: &'a EntityMetadata,
    kind: ShardingKeyKind,
    mapper: &'a M,
    options: ResolveOptions,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a, M: KeyToTailMapper + ?Sized> RouteResolver<'a, M> {
    pub fn new(metadata: &'a EntityMetadata, kind: ShardingKeyKind, mapper: &'a M) -> Self {
        Self {
            metadata,
            kind,
            mapper,
            options: ResolveOptions::default(),
            metrics: None,
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn kind(&self) -> ShardingKeyKind {
        self.kind
    }

    /// Folds one filter into a tail predicate
    pub fn resolve(&self, node: &PredicateNode) -> RouteResult<TailPredicate> {
        let predicate = self.fold(node, false, 1)?;
        self.record(&predicate);
        Ok(predicate)
    }

    /// Folds a chain of successive filters (each one a `Where`), ANDed
    pub fn route(&self, filters: &[PredicateNode]) -> RouteResult<RouteResolution> {
        let mut parts = Vec::with_capacity(filters.len());
        for node in filters {
            parts.push(self.fold(node, false, 1)?);
        }
        let predicate = TailPredicate::all(parts);
        self.record(&predicate);
        Ok(RouteResolution::new(
            self.metadata.entity.clone(),
            self.kind,
            predicate,
        ))
    }

    fn record(&self, predicate: &TailPredicate) {
        if let Some(metrics) = self.metrics {
            metrics.record_resolution(predicate.is_always());
        }
        if Logger::enabled(Severity::Trace) {
            let full_scan = predicate.is_always().to_string();
            let rendered = predicate.to_string();
            log_event(
                Event::RouteResolved,
                &[
                    ("entity", self.metadata.entity.as_str()),
                    ("key", self.kind.as_str()),
                    ("full_scan", full_scan.as_str()),
                    ("predicate", rendered.as_str()),
                ],
            );
        }
    }

    fn fold(&self, node: &PredicateNode, negated: bool, depth: usize) -> RouteResult<TailPredicate> {
        if depth > self.options.max_depth {
            if let Some(metrics) = self.metrics {
                metrics.record_depth_limit();
            }
            let limit = self.options.max_depth.to_string();
            log_event(
                Event::RouteDepthLimit,
                &[
                    ("entity", self.metadata.entity.as_str()),
                    ("max_depth", limit.as_str()),
                ],
            );
            return Ok(TailPredicate::Always);
        }

        match node {
            PredicateNode::And { left, right } => {
                let l = self.fold(left, negated, depth + 1)?;
                let r = self.fold(right, negated, depth + 1)?;
                Ok(if negated { l.or(r) } else { l.and(r) })
            }
            PredicateNode::Or { left, right } => {
                let l = self.fold(left, negated, depth + 1)?;
                let r = self.fold(right, negated, depth + 1)?;
                Ok(if negated { l.and(r) } else { l.or(r) })
            }
            PredicateNode::Not { inner } => self.fold(inner, !negated, depth + 1),
            PredicateNode::Compare { left, op, right } => {
                let op = match (negated, *op) {
                    (false, op) => op,
                    (true, op @ (ShardingOperator::Equal | ShardingOperator::NotEqual)) => {
                        op.negate()
                    }
                    // a null key satisfies NOT (k < v) but not k >= v
                    (true, _) => ShardingOperator::Unknown,
                };
                self.compare(left, op, right)
            }
            PredicateNode::EqualsCall { receiver, argument } => {
                let op = if negated {
                    ShardingOperator::NotEqual
                } else {
                    ShardingOperator::Equal
                };
                self.compare(receiver, op, argument)
            }
            PredicateNode::Membership {
                collection,
                item,
                negated: inner,
            } => self.membership(collection, item, *inner != negated),
            PredicateNode::Opaque { .. } => Ok(self.opaque()),
        }
    }

    fn compare(
        &self,
        left: &Operand,
        op: ShardingOperator,
        right: &Operand,
    ) -> RouteResult<TailPredicate> {
        let Some(key) = self.metadata.key(self.kind) else {
            return Ok(self.opaque());
        };

        let (value_side, key_on_left) = match (self.is_key(left), self.is_key(right)) {
            (true, false) if right.is_literal_shaped() => (right, true),
            (false, true) if left.is_literal_shaped() => (left, false),
            _ => return Ok(self.opaque()),
        };

        let value = match literal::extract(value_side) {
            Ok(Literal::Value(v)) => v,
            Ok(Literal::Unresolvable) => return Ok(self.opaque()),
            Err(e) => return Err(self.literal_failed(key, e)),
        };

        let op = op.oriented(key_on_left);
        if !op.is_known() {
            return Ok(self.opaque());
        }

        match self.typed(key, &value) {
            Some(v) => Ok(self.mapper.tail_predicate(&v, op)),
            None => Ok(self.opaque()),
        }
    }

    fn membership(
        &self,
        collection: &CollectionExpr,
        item: &Operand,
        negated: bool,
    ) -> RouteResult<TailPredicate> {
        let Some(key) = self.metadata.key(self.kind) else {
            return Ok(self.opaque());
        };
        if !self.is_key(item) {
            return Ok(self.opaque());
        }

        let items = match literal::materialize(collection) {
            Ok(Some(items)) => items,
            Ok(None) => return Ok(self.opaque()),
            Err(e) => return Err(self.literal_failed(key, e)),
        };

        if negated {
            // Dropping an element only loosens the intersection.
            let leaves = items
                .iter()
                .filter_map(|v| self.typed(key, v))
                .map(|v| self.mapper.tail_predicate(&v, ShardingOperator::NotEqual));
            return Ok(TailPredicate::all(leaves));
        }

        let mut leaves = Vec::with_capacity(items.len());
        for v in &items {
            match self.typed(key, v) {
                Some(v) => leaves.push(self.mapper.tail_predicate(&v, ShardingOperator::Equal)),
                None => return Ok(self.opaque()),
            }
        }
        Ok(TailPredicate::any(leaves))
    }

    fn is_key(&self, operand: &Operand) -> bool {
        operand
            .as_property()
            .is_some_and(|p| self.metadata.is_sharding_key(self.kind, p))
    }

    /// Types a host value into the key domain, applying the zero-value policy
    fn typed(&self, key: &ShardingKey, value: &Value) -> Option<ShardKeyValue> {
        if value.is_null() {
            return None;
        }
        let Some(typed) = key.key_type.coerce(value) else {
            if Logger::enabled(Severity::Trace) {
                let rendered = value.to_string();
                log_event(
                    Event::RouteKeyUnsupported,
                    &[
                        ("entity", self.metadata.entity.as_str()),
                        ("property", key.property.as_str()),
                        ("key_type", key.key_type.as_str()),
                        ("value", rendered.as_str()),
                    ],
                );
            }
            return None;
        };
        if typed.is_default() && self.options.zero_values == ZeroValuePolicy::TreatAsAbsent {
            return None;
        }
        Some(typed)
    }

    fn opaque(&self) -> TailPredicate {
        if let Some(metrics) = self.metrics {
            metrics.record_opaque();
        }
        TailPredicate::Always
    }

    fn literal_failed(&self, key: &ShardingKey, source: LiteralError) -> RouteError {
        if let Some(metrics) = self.metrics {
            metrics.record_failure();
        }
        let reason = source.to_string();
        log_event(
            Event::RouteLiteralFailed,
            &[
                ("entity", self.metadata.entity.as_str()),
                ("property", key.property.as_str()),
                ("reason", reason.as_str()),
            ],
        );
        RouteError::LiteralEvaluation {
            entity: self.metadata.entity.clone(),
            property: key.property.clone(),
            source,
        }
    }
}
