//! Route resolution for sharded entities
//!
//! Folds a filter expression into a tail predicate per sharding key so the
//! dispatcher only touches tails that can hold matching rows.
//!
//! # Design Principles
//!
//! - Sound: a tail is excluded only if no matching row can live in it
//! - Deterministic: same tree, metadata and mapper produce the same predicate
//! - Read-only: the input tree is never mutated
//!
//! # Folding
//!
//! 1. `And` intersects, `Or` unions, `Not` is pushed down
//! 2. Comparisons against the key reach the mapper as `key <op> value`
//! 3. Membership expands to `Equal` (or `NotEqual`) leaves
//! 4. Everything else admits every tail

mod ast;
mod errors;
mod literal;
mod mapper;
mod operator;
mod predicate;
mod resolver;
mod result;
mod value;

pub use ast::{
    CollectionExpr, DeferredValue, EntityMetadata, Operand, PredicateNode, PropertyRef,
    ShardingKey, ShardingKeyKind,
};
pub use errors::{LiteralError, RouteError, RouteResult};
pub use literal::{extract, materialize, Literal};
pub use mapper::{KeyToTailMapper, SymbolicMapper};
pub use operator::ShardingOperator;
pub use predicate::{TailFilter, TailPredicate};
pub use resolver::{ResolveOptions, RouteResolver, ZeroValuePolicy, DEFAULT_MAX_DEPTH};
pub use result::{RouteResolution, RouteSummary};
pub use value::{ShardKeyType, ShardKeyValue};
