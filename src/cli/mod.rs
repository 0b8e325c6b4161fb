//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Fieldbridge using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Fieldbridge - legacy annotation migration tool
#[derive(Parser, Debug)]
#[command(name = "fieldbridge")]
#[command(version, about, long_about = None)]
#[command(author = "Fieldbridge Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "fieldbridge.toml",
        env = "FIELDBRIDGE_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FIELDBRIDGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the migration against the configured target store
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show migration status and sequence high-water mark
    Status(commands::status::StatusArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["fieldbridge", "run"]);
        assert_eq!(cli.config, "fieldbridge.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["fieldbridge", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["fieldbridge", "--log-level", "debug", "run"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["fieldbridge", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["fieldbridge", "status"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }
}
