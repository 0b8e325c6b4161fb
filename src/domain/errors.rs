//! Domain error types
//!
//! This module defines the error hierarchy for Fieldbridge. All errors are
//! domain-specific and don't expose third-party types. The variants mirror
//! the failure boundaries of the migration engine: fatal configuration
//! problems, per-record context misses, unit-level store failures, and
//! per-record update reconciliation failures.

use thiserror::Error;

/// Main Fieldbridge error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Configuration-related errors (bad/missing config file, bad/missing
    /// mapping table). Fatal before any processing starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An insert candidate's protocol identifier has no entry in the
    /// context map. The record is excluded from its batch and logged;
    /// sibling records are unaffected.
    #[error("No target context for protocol '{protocol_id}' (record {label})")]
    ContextResolution { label: String, protocol_id: String },

    /// A store-level failure (constraint violation, connectivity blip)
    /// discovered while applying a pending write unit. The whole unit is
    /// rolled back and every member is logged.
    #[error("Store execution error: {0}")]
    StoreExecution(String),

    /// A failure while reconciling a single update candidate. Only that
    /// record's writes are rolled back.
    #[error("Reconciliation failed for record {label}: {message}")]
    Reconciliation { label: String, message: String },

    /// Database-related errors outside the batch/record failure
    /// boundaries (pool exhaustion, seed queries, cursor reads).
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors (failure log, mapping file reads)
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl MigrationError {
    /// True for errors handled inside the batch/record failure boundaries.
    ///
    /// Non-recoverable errors terminate the run; recoverable ones are
    /// written to the failure log and the run continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MigrationError::ContextResolution { .. }
                | MigrationError::StoreExecution(_)
                | MigrationError::Reconciliation { .. }
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        MigrationError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for MigrationError {
    fn from(err: toml::de::Error) -> Self {
        MigrationError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv errors (mapping table, failure log)
impl From<csv::Error> for MigrationError {
    fn from(err: csv::Error) -> Self {
        MigrationError::Io(format!("CSV error: {err}"))
    }
}
