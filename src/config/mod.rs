//! Configuration management.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Fieldbridge uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Environment variable overrides (`FIELDBRIDGE_*` prefix)
//! - Default values for optional settings
//! - Per-section validation
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [postgresql]
//! connection_string = "${FIELDBRIDGE_DATABASE_URL}"
//!
//! [source]
//! specimen_table = "legacy_specimen"
//! form_table = "legacy_annotation_form"
//! page_size = 500
//!
//! [mapping]
//! path = "field_details.csv"
//!
//! [migration]
//! batch_size = 100
//! created_by = "migration"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    AppConfig, ApplicationConfig, LoggingConfig, MappingConfig, MigrationConfig, PostgreSqlConfig,
    SourceConfig,
};
