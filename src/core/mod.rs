//! Core migration logic
//!
//! This module contains the migration engine proper: record sanitation
//! and classification, mapping-rule resolution, entry-id sequencing, the
//! transactional writers, and the durable failure log.

pub mod classify;
pub mod failure;
pub mod mapping;
pub mod migrate;
pub mod sanitize;
pub mod sequence;
