//! Virtual datasource configuration
//!
//! Describes the physical datasources behind a sharded context: connection
//! strings, connection limits, read/write separation, and the comparer and
//! table discovery collaborators routing relies on.

mod comparer;
mod config;
mod errors;
mod table_ensure;

pub use comparer::{CaseInsensitiveComparer, ComparerKind, NaturalComparer, ShardingComparer};
pub use config::{
    ConnectionMode, DataSourceConfigParams, ReadConnStringStrategy, ReadStrategy,
    ReadWriteSeparationConfig, VirtualDataSourceConfig,
};
pub use errors::{DataSourceError, DataSourceResult};
pub use table_ensure::{
    EmptyTableEnsureManager, StaticTableEnsureManager, TableEnsureConfig, TableEnsureManager,
};
