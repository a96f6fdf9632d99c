//! Virtual datasource configuration
//!
//! A JSON file describes the default datasource, any extra datasources,
//! optional read/write separation and the comparer and table discovery the
//! routing layer should use. `DataSourceConfigParams::build` validates the
//! file once; everything downstream trusts the built params.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::comparer::{ComparerKind, ShardingComparer};
use super::errors::{DataSourceError, DataSourceResult};
use super::table_ensure::{TableEnsureConfig, TableEnsureManager};
use crate::observability::{log_event, Event};

/// How queries acquire connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Chosen per query from the connection limit and tail count
    #[default]
    SystemAuto,
    /// Never exceed the connection limit
    ConnectionStrictly,
    /// One connection per tail, streaming results
    MemoryStrictly,
}

/// How a read connection is picked among replicas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    Random,
    #[default]
    Loop,
}

/// When the read connection string is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadConnStringStrategy {
    /// Pick again for every query
    PerQuery,
    /// Pick once per context, on first use
    #[default]
    LatestFirstTime,
    /// Pick again every time a connection is opened
    LatestEveryTime,
}

/// Read/write separation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWriteSeparationConfig {
    /// Read connection strings per datasource name
    pub configs: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub read_strategy: ReadStrategy,
    /// Whether new contexts read from replicas by default
    #[serde(default = "default_enable")]
    pub default_enable: bool,
    #[serde(default = "default_read_priority")]
    pub default_priority: i32,
    #[serde(default)]
    pub read_conn_string_strategy: ReadConnStringStrategy,
}

fn default_enable() -> bool {
    true
}

fn default_read_priority() -> i32 {
    10
}

fn default_config_id() -> String {
    "default".to_string()
}

fn default_max_query_connections() -> usize {
    16
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDataSourceConfig {
    #[serde(default = "default_config_id")]
    pub config_id: String,

    /// Higher priority configurations win when several are registered
    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_max_query_connections")]
    pub max_query_connections_limit: usize,

    #[serde(default)]
    pub connection_mode: ConnectionMode,

    pub default_data_source_name: String,

    pub default_connection_string: String,

    #[serde(default)]
    pub extra_data_sources: BTreeMap<String, String>,

    #[serde(default)]
    pub read_write_separation: Option<ReadWriteSeparationConfig>,

    #[serde(default)]
    pub comparer: ComparerKind,

    #[serde(default)]
    pub table_ensure: TableEnsureConfig,
}

impl VirtualDataSourceConfig {
    /// Reads and parses a config file without validating it
    pub fn read(path: &Path) -> DataSourceResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| DataSourceError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Checks the configuration
    pub fn validate(&self) -> DataSourceResult<()> {
        if self.config_id.trim().is_empty() {
            return Err(DataSourceError::invalid("config_id must not be empty"));
        }
        if self.default_data_source_name.trim().is_empty() {
            return Err(DataSourceError::invalid(
                "default_data_source_name must not be empty",
            ));
        }
        if self.default_connection_string.trim().is_empty() {
            return Err(DataSourceError::invalid(
                "default_connection_string must not be empty",
            ));
        }
        if self.max_query_connections_limit == 0 {
            return Err(DataSourceError::invalid(
                "max_query_connections_limit must be > 0",
            ));
        }

        for (name, conn) in &self.extra_data_sources {
            if name.trim().is_empty() {
                return Err(DataSourceError::invalid(
                    "extra datasource names must not be empty",
                ));
            }
            if *name == self.default_data_source_name {
                return Err(DataSourceError::invalid(format!(
                    "extra datasource '{}' duplicates the default datasource",
                    name
                )));
            }
            if conn.trim().is_empty() {
                return Err(DataSourceError::invalid(format!(
                    "connection string for datasource '{}' must not be empty",
                    name
                )));
            }
        }

        if let Some(rw) = &self.read_write_separation {
            for (name, reads) in &rw.configs {
                if !self.is_known(name) {
                    return Err(DataSourceError::invalid(format!(
                        "read/write separation references unknown datasource '{}'",
                        name
                    )));
                }
                if reads.is_empty() {
                    return Err(DataSourceError::invalid(format!(
                        "datasource '{}' has no read connections",
                        name
                    )));
                }
                if reads.iter().any(|c| c.trim().is_empty()) {
                    return Err(DataSourceError::invalid(format!(
                        "datasource '{}' has an empty read connection string",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    fn is_known(&self, name: &str) -> bool {
        name == self.default_data_source_name || self.extra_data_sources.contains_key(name)
    }
}

/// Validated datasource parameters
pub struct DataSourceConfigParams {
    config: VirtualDataSourceConfig,
    comparer: Box<dyn ShardingComparer>,
    table_ensure: Box<dyn TableEnsureManager>,
}

impl DataSourceConfigParams {
    /// Validates a configuration and instantiates its collaborators
    pub fn build(config: VirtualDataSourceConfig) -> DataSourceResult<Self> {
        config.validate()?;
        let comparer = config.comparer.build();
        let table_ensure = config.table_ensure.build();
        Ok(Self {
            config,
            comparer,
            table_ensure,
        })
    }

    /// Reads, validates and builds a config file, logging the outcome
    pub fn load(path: &Path) -> DataSourceResult<Self> {
        let path_str = path.display().to_string();
        match VirtualDataSourceConfig::read(path).and_then(Self::build) {
            Ok(params) => {
                let count = params.data_source_names().len().to_string();
                log_event(
                    Event::ConfigLoaded,
                    &[
                        ("config_id", params.config_id()),
                        ("data_sources", count.as_str()),
                        ("path", path_str.as_str()),
                    ],
                );
                Ok(params)
            }
            Err(e) => {
                let reason = e.to_string();
                log_event(
                    Event::ConfigRejected,
                    &[
                        ("code", e.code()),
                        ("path", path_str.as_str()),
                        ("reason", reason.as_str()),
                    ],
                );
                Err(e)
            }
        }
    }

    pub fn config(&self) -> &VirtualDataSourceConfig {
        &self.config
    }

    pub fn config_id(&self) -> &str {
        &self.config.config_id
    }

    pub fn priority(&self) -> i32 {
        self.config.priority
    }

    pub fn max_query_connections_limit(&self) -> usize {
        self.config.max_query_connections_limit
    }

    pub fn connection_mode(&self) -> ConnectionMode {
        self.config.connection_mode
    }

    pub fn default_data_source_name(&self) -> &str {
        &self.config.default_data_source_name
    }

    /// Default datasource first, then extras in name order
    pub fn data_source_names(&self) -> Vec<&str> {
        std::iter::once(self.config.default_data_source_name.as_str())
            .chain(self.config.extra_data_sources.keys().map(String::as_str))
            .collect()
    }

    /// Write connection string of a datasource
    pub fn connection_string(&self, name: &str) -> DataSourceResult<&str> {
        if name == self.config.default_data_source_name {
            return Ok(&self.config.default_connection_string);
        }
        self.config
            .extra_data_sources
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| DataSourceError::UnknownDataSource(name.to_string()))
    }

    /// Read connection strings of a datasource.
    ///
    /// Without read/write separation for `name` this is the write connection.
    pub fn read_connection_strings(&self, name: &str) -> DataSourceResult<Vec<&str>> {
        let write = self.connection_string(name)?;
        let reads = self
            .config
            .read_write_separation
            .as_ref()
            .and_then(|rw| rw.configs.get(name));
        Ok(match reads {
            Some(reads) => reads.iter().map(String::as_str).collect(),
            None => vec![write],
        })
    }

    pub fn read_write_separation(&self) -> Option<&ReadWriteSeparationConfig> {
        self.config.read_write_separation.as_ref()
    }

    /// True when new contexts should read from replicas
    pub fn reads_from_replicas_by_default(&self) -> bool {
        self.read_write_separation()
            .is_some_and(|rw| rw.default_enable)
    }

    pub fn comparer(&self) -> &dyn ShardingComparer {
        self.comparer.as_ref()
    }

    pub fn table_ensure(&self) -> &dyn TableEnsureManager {
        self.table_ensure.as_ref()
    }
}

impl fmt::Debug for DataSourceConfigParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceConfigParams")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
