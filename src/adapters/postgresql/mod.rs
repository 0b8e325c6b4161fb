//! PostgreSQL adapter
//!
//! This module provides connection pooling plus the two query surfaces
//! the engine needs: `TargetStore` for reads against the annotation
//! schema and `SourceCursor` for paginated extraction from the legacy
//! tables.

pub mod client;
pub mod source;
pub mod store;

pub use client::PostgresClient;
pub use source::SourceCursor;
pub use store::TargetStore;
