//! CLI argument definitions using clap
//!
//! Commands:
//! - shardroute check --config <path>
//! - shardroute explain < request.json

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// shardroute - sound shard route resolution
#[derive(Parser, Debug)]
#[command(name = "shardroute")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Minimum log severity (trace, info, warn, error, fatal)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a virtual datasource configuration file
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./datasources.json")]
        config: PathBuf,
    },

    /// Fold a route request read from stdin and print the tail predicate
    Explain,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["shardroute", "check", "--config", "ds.json"]).unwrap();
        assert_eq!(cli.log_level, "warn");
        match cli.command {
            Command::Check { config } => assert_eq!(config, PathBuf::from("ds.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_explain_with_log_level() {
        let cli = Cli::try_parse_from(["shardroute", "explain", "--log-level", "trace"]).unwrap();
        assert_eq!(cli.log_level, "trace");
        assert!(matches!(cli.command, Command::Explain));
    }
}
