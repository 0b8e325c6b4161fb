// Fieldbridge - Legacy Annotation Migration Tool
// Copyright (c) 2026 Fieldbridge Contributors
// Licensed under the MIT License

//! # Fieldbridge - Legacy Annotation Migration
//!
//! Fieldbridge migrates flat-form clinical annotation records out of a
//! legacy relational store into a dynamic entity-attribute-value (EAV)
//! PostgreSQL schema, driven by a declarative field-mapping table.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** legacy records through a paginated source cursor
//! - **Classifying** records into insert and update candidates
//! - **Mapping** each legacy field to its target table and column,
//!   honoring single- vs multi-valued cardinality
//! - **Writing** transactionally in bounded batches with per-batch
//!   (insert) and per-record (update) failure isolation
//! - **Allocating** monotonic entry identifiers that survive restarts
//!
//! ## Architecture
//!
//! Fieldbridge follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (sanitize, classify, mapping, sequence,
//!   migrate, failure log)
//! - [`adapters`] - PostgreSQL client, target store and source cursor
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fieldbridge::config::load_config;
//! use fieldbridge::core::migrate::MigrationCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("fieldbridge.toml")?;
//!
//!     let coordinator = MigrationCoordinator::new(config).await?;
//!     let summary = coordinator.execute().await?;
//!
//!     println!(
//!         "Inserted {} and updated {} records",
//!         summary.inserted, summary.updated
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Handling
//!
//! Per-record and per-batch failures never abort a run. Failed records
//! are appended to durable CSV failure logs with their cause, for
//! operator replay; the run continues and exits 0. Only configuration
//! and connectivity errors that prevent the run from starting are fatal.
//!
//! ## Logging
//!
//! Fieldbridge uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(processed = 300, inserted = 120, "Batch complete");
//! warn!(record = "SPEC-0041", "Recorded migration failure");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
