//! Datasource configuration errors
//!
//! All of these are raised while loading or building a configuration. Once a
//! `DataSourceConfigParams` exists, only lookups of unknown names can fail.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    #[error("failed to read config '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config JSON: {0}")]
    Parse(String),

    #[error("invalid datasource configuration: {0}")]
    Invalid(String),

    #[error("unknown datasource '{0}'")]
    UnknownDataSource(String),
}

impl DataSourceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DataSourceError::Invalid(message.into())
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DataSourceError::Read { .. } => "SHARD_DATASOURCE_CONFIG_READ",
            DataSourceError::Parse(_) => "SHARD_DATASOURCE_CONFIG_PARSE",
            DataSourceError::Invalid(_) => "SHARD_DATASOURCE_CONFIG_INVALID",
            DataSourceError::UnknownDataSource(_) => "SHARD_DATASOURCE_UNKNOWN",
        }
    }
}

impl From<serde_json::Error> for DataSourceError {
    fn from(e: serde_json::Error) -> Self {
        DataSourceError::Parse(e.to_string())
    }
}

pub type DataSourceResult<T> = Result<T, DataSourceError>;
