//! shardroute - sound shard route resolution
//!
//! Folds a query's filter expression into a predicate over shard tails so a
//! sharded data layer queries only the tails that can hold matching rows.
//!
//! - `routing`: predicate tree model, literal extraction, the resolver
//! - `datasource`: virtual datasource configuration
//! - `observability`: structured logging and counters
//! - `cli`: `check` and `explain` commands

pub mod cli;
pub mod datasource;
pub mod observability;
pub mod routing;
