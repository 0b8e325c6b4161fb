//! Source record model
//!
//! A source record is one flat row extracted from the legacy annotation
//! tables: a mapping from legacy field name to raw value plus the keys the
//! engine needs to place it in the target schema.

use serde_json::Value;
use std::collections::BTreeMap;

/// One flat legacy annotation record.
///
/// Records are read once per run from the paginated extraction cursor and
/// only ever mutated in memory (by the value sanitizer). The presence of
/// `entry_id` decides the record's path: `Some` means the record was
/// already migrated and needs reconciling updates, `None` means it still
/// needs a fresh entry in the target schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Human-readable identifier (the specimen barcode where available),
    /// used to key failure-log entries deterministically.
    pub label: String,

    /// Foreign key to the parent specimen/subject entity.
    pub specimen_id: String,

    /// Protocol identifier, resolved to a target context id per batch.
    pub protocol_id: String,

    /// Target record identifier, present only for already-migrated rows.
    /// The extraction cursor maps NULL and empty values to `None`.
    pub entry_id: Option<i64>,

    /// Legacy field name -> raw value. BTreeMap keeps field iteration
    /// order deterministic for logs and tests.
    pub fields: BTreeMap<String, Value>,
}

impl SourceRecord {
    /// Create a record with no field values set.
    pub fn new(
        label: impl Into<String>,
        specimen_id: impl Into<String>,
        protocol_id: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            specimen_id: specimen_id.into(),
            protocol_id: protocol_id.into(),
            entry_id: None,
            fields: BTreeMap::new(),
        }
    }

    /// Set the existing target record identifier (builder style).
    pub fn with_entry_id(mut self, entry_id: i64) -> Self {
        self.entry_id = Some(entry_id);
        self
    }

    /// Set a legacy field value (builder style).
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a legacy field's value as a string slice, if it is a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}
