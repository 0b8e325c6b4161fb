// Fieldbridge - Legacy Annotation Migration Tool
// Copyright (c) 2026 Fieldbridge Contributors
// Licensed under the MIT License

use clap::Parser;
use fieldbridge::cli::{Cli, Commands};
use fieldbridge::config::{load_config, AppConfig};
use fieldbridge::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    // This is optional - if .env doesn't exist, it's silently ignored
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Configuration is loaded before logging so the file layer can be
    // wired from the [logging] section
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(2);
        }
    };

    // CLI log level wins over the configured one
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.application.log_level.clone());
    let _logging_guard = match init_logging(&log_level, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Fieldbridge - Legacy Annotation Migration Tool"
    );

    // Execute command and get exit code
    let exit_code = match execute_command(&cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, config: AppConfig) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Run(args) => args.execute(config).await,
        Commands::ValidateConfig(args) => args.execute(&config, &cli.config).await,
        Commands::Status(args) => args.execute(&config).await,
    }
}
