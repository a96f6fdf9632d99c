//! CLI module for shardroute
//!
//! Provides command-line interface for:
//! - check: validate a virtual datasource configuration
//! - explain: fold a route request and print the tail predicate

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, explain, explain_request, run, run_command, ExplainRequest};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
