//! Store adapters
//!
//! Thin I/O wrappers around the PostgreSQL stores: the pooled client, the
//! target-schema reads, and the paginated legacy extraction cursor. All
//! migration semantics live in `core`; the adapters only move rows.

pub mod postgresql;
