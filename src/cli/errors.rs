//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::datasource::DataSourceError;
use crate::routing::RouteError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Bad command-line usage
    Usage,
    /// Configuration file error
    ConfigError,
    /// Malformed request on stdin
    InvalidRequest,
    /// Route resolution failed
    RouteFailed,
    /// I/O error (stdin/stdout)
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usage => "SHARD_CLI_USAGE",
            Self::ConfigError => "SHARD_CLI_CONFIG_ERROR",
            Self::InvalidRequest => "SHARD_CLI_INVALID_REQUEST",
            Self::RouteFailed => "SHARD_CLI_ROUTE_FAILED",
            Self::IoError => "SHARD_CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::Usage, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_request(format!("JSON error: {}", e))
    }
}

impl From<DataSourceError> for CliError {
    fn from(e: DataSourceError) -> Self {
        Self::config_error(format!("{}: {}", e.code(), e))
    }
}

impl From<RouteError> for CliError {
    fn from(e: RouteError) -> Self {
        Self::new(CliErrorCode::RouteFailed, format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = CliError::usage("unknown log level 'loud'");
        assert_eq!(err.to_string(), "SHARD_CLI_USAGE: unknown log level 'loud'");
    }

    #[test]
    fn test_from_datasource_error() {
        let err: CliError = DataSourceError::invalid("bad").into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert!(err.message().starts_with("SHARD_DATASOURCE_CONFIG_INVALID"));
    }
}
