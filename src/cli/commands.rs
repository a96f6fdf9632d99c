//! CLI command implementations
//!
//! Commands are one-shot: read input, do the work, print one JSON response,
//! exit.

use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::datasource::DataSourceConfigParams;
use crate::observability::{log_event, Event, Logger, MetricsRegistry, Severity};
use crate::routing::{
    EntityMetadata, PredicateNode, ResolveOptions, RouteResolver, ShardingKeyKind,
    SymbolicMapper,
};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Route request accepted by `explain`
#[derive(Debug, Clone, Deserialize)]
pub struct ExplainRequest {
    pub entity: EntityMetadata,
    pub key: ShardingKeyKind,
    /// Successive filters, ANDed
    #[serde(default)]
    pub filters: Vec<PredicateNode>,
    #[serde(default)]
    pub options: ResolveOptions,
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let severity = Severity::parse(&cli.log_level)
        .ok_or_else(|| CliError::usage(format!("unknown log level '{}'", cli.log_level)))?;
    Logger::set_min_severity(severity);
    Logger::set_stderr_only(true);

    let result = run_command(cli.command);
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { config } => check(&config),
        Command::Explain => explain(),
    }
}

/// Validate a datasource configuration file
pub fn check(config_path: &Path) -> CliResult<()> {
    let params = DataSourceConfigParams::load(config_path)?;
    write_response(check_summary(&params))
}

fn check_summary(params: &DataSourceConfigParams) -> Value {
    let config = params.config();
    json!({
        "config_id": params.config_id(),
        "priority": params.priority(),
        "connection_mode": config.connection_mode,
        "max_query_connections_limit": params.max_query_connections_limit(),
        "default_data_source": params.default_data_source_name(),
        "data_sources": params.data_source_names(),
        "read_write_separation": params.read_write_separation().is_some(),
        "comparer": config.comparer,
    })
}

/// Fold a route request from stdin and print its summary
pub fn explain() -> CliResult<()> {
    let request: ExplainRequest = serde_json::from_value(read_request()?)?;
    let data = explain_request(&request)?;
    write_response(data)
}

/// Resolves a request with the symbolic mapper.
///
/// Nothing is narrowed; the output shows which constraints reached the key.
pub fn explain_request(request: &ExplainRequest) -> CliResult<Value> {
    let key = request.entity.key(request.key).ok_or_else(|| {
        CliError::invalid_request(format!(
            "entity '{}' has no {} sharding key",
            request.entity.entity, request.key
        ))
    })?;

    let mapper = SymbolicMapper::new(key.property.clone());
    let metrics = MetricsRegistry::new();
    let resolution = RouteResolver::new(&request.entity, request.key, &mapper)
        .with_options(request.options.clone())
        .with_metrics(&metrics)
        .route(&request.filters)?;

    log_event(
        Event::ExplainComplete,
        &[
            ("entity", request.entity.entity.as_str()),
            ("key", request.key.as_str()),
        ],
    );

    Ok(json!({
        "route": resolution.summary(),
        "metrics": metrics.snapshot(),
    }))
}
