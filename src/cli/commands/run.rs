//! Run command implementation
//!
//! This module implements the `run` command driving a full migration of
//! the legacy annotation records into the target store.

use crate::config::AppConfig;
use crate::core::migrate::MigrationCoordinator;
use crate::domain::MigrationError;
use clap::Args;

/// Exit code for a coordinator that failed to start. A bad mapping table
/// or a rule the live schema rejects is a configuration error (2); an
/// unreachable store is a connection error (4).
pub(crate) fn startup_exit_code(err: &MigrationError) -> i32 {
    match err {
        MigrationError::Configuration(_) => 2,
        _ => 4,
    }
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run mode - plan the migration without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Override the insert/update batch size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override the source extraction page size
    #[arg(long)]
    pub page_size: Option<usize>,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, mut config: AppConfig) -> anyhow::Result<i32> {
        tracing::info!("Starting migration command");

        // Apply CLI overrides
        if let Some(batch_size) = self.batch_size {
            tracing::info!(batch_size, "Overriding batch size from CLI");
            config.migration.batch_size = batch_size;
        }

        if let Some(page_size) = self.page_size {
            tracing::info!(page_size, "Overriding page size from CLI");
            config.source.page_size = page_size;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        // Re-validate after overrides
        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2); // Configuration error exit code
        }

        if config.application.dry_run {
            println!("🔍 DRY RUN MODE - No data will be written to the target store");
            println!();
        }

        // Confirmation prompt (unless --yes or dry-run)
        if !self.yes && !config.application.dry_run {
            println!("Migration Configuration:");
            println!(
                "  Source: {} joined with {}",
                config.source.specimen_table, config.source.form_table
            );
            println!("  Mapping table: {}", config.mapping.path.display());
            println!("  Batch size: {}", config.migration.batch_size);
            println!("  Page size: {}", config.source.page_size);
            println!();
            print!("Proceed with migration? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Migration cancelled.");
                return Ok(0);
            }
        }

        tracing::info!("Creating migration coordinator");
        let coordinator = match MigrationCoordinator::new(config).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create migration coordinator");
                eprintln!("Failed to initialize migration: {e}");
                return Ok(startup_exit_code(&e));
            }
        };

        println!("🚀 Starting migration...");
        println!();

        let summary = match coordinator.execute().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Migration failed");
                eprintln!("Migration failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        // Display summary
        println!();
        println!("📊 Migration Summary:");
        println!("  Processed: {}", summary.processed);
        println!("  Inserted: {}", summary.inserted);
        println!("  Updated: {}", summary.updated);
        println!("  Failed: {}", summary.failed);
        println!("  Pages: {}", summary.pages);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!("  Success Rate: {:.2}%", summary.success_rate());
        println!();

        // Per-record failures are logged for replay, never fatal; the
        // process exits 0 either way.
        if summary.is_successful() {
            println!("✅ Migration completed successfully!");
        } else {
            println!("⚠️  Migration completed with failures; see the failure logs.");
        }

        Ok(0)
    }
}
