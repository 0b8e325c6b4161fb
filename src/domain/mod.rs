//! Core domain types and models
//!
//! This module contains the domain layer: error types, the source record
//! model, field mapping rules, and the protocol context map.

pub mod context;
pub mod errors;
pub mod mapping;
pub mod record;
pub mod result;

// Re-export commonly used types
pub use context::ContextMap;
pub use errors::MigrationError;
pub use mapping::{Cardinality, FieldMappingRule};
pub use record::SourceRecord;
pub use result::Result;
