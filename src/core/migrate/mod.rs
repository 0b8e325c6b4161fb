//! Migration engine
//!
//! The engine turns classified source records into typed write operations
//! and applies them against the target store with two distinct failure
//! contracts: unit-level atomicity for inserts (a whole pending batch
//! commits or rolls back together) and record-level isolation for updates
//! (one record's failure rolls back only that record's writes). The two
//! paths share the operation vocabulary defined here but deliberately not
//! a code path.

pub mod coordinator;
pub mod insert;
pub mod summary;
pub mod update;

pub use coordinator::MigrationCoordinator;
pub use summary::RunSummary;

use serde_json::Value;
use tokio_postgres::Transaction;

/// Target entry table: one row per migrated annotation record.
pub const ENTRY_TABLE: &str = "annotation_entry";

/// Single-row sequence counter holding the published high-water mark.
pub const SEQUENCE_TABLE: &str = "annotation_sequence";

/// Protocol-to-context lookup table.
pub const CONTEXT_TABLE: &str = "protocol_context";

/// Status marker stamped on every migrated entry.
pub const ENTRY_STATUS_COMPLETE: &str = "COMPLETE";

/// One parameterized mutation against the target store.
///
/// Table and column names come from mapping rules that were
/// identifier-checked at parse time and verified against the live schema
/// at startup; values always travel as statement parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// New row in the entry table linking context, specimen and entry id.
    InsertEntry {
        entry_id: i64,
        context_id: i64,
        specimen_id: String,
        created_by: String,
        status: String,
    },
    /// Insert-or-overwrite of a single-valued column keyed by entry id.
    UpsertSingle {
        table: String,
        column: String,
        entry_id: i64,
        value: String,
    },
    /// Insert-or-overwrite of one multi-value token keyed by
    /// (entry id, value), so replays collapse to one row.
    UpsertMulti {
        table: String,
        column: String,
        entry_id: i64,
        value: String,
    },
}

impl WriteOp {
    /// Render the statement text for this operation.
    pub fn sql(&self) -> String {
        match self {
            WriteOp::InsertEntry { .. } => format!(
                "INSERT INTO {ENTRY_TABLE} (entry_id, context_id, specimen_id, created_by, status) \
                 VALUES ($1, $2, $3, $4, $5)"
            ),
            WriteOp::UpsertSingle { table, column, .. } => format!(
                "INSERT INTO {table} (entry_id, {column}) VALUES ($1, $2) \
                 ON CONFLICT (entry_id) DO UPDATE SET {column} = EXCLUDED.{column}"
            ),
            WriteOp::UpsertMulti { table, column, .. } => format!(
                "INSERT INTO {table} (entry_id, {column}) VALUES ($1, $2) \
                 ON CONFLICT (entry_id, {column}) DO UPDATE SET {column} = EXCLUDED.{column}"
            ),
        }
    }
}

/// Statement publishing the sequence high-water mark.
///
/// GREATEST keeps the counter monotonic even if an older value is replayed.
pub fn publish_sequence_sql() -> String {
    format!(
        "INSERT INTO {SEQUENCE_TABLE} (id, last_entry_id) VALUES (1, $1) \
         ON CONFLICT (id) DO UPDATE \
         SET last_entry_id = GREATEST({SEQUENCE_TABLE}.last_entry_id, EXCLUDED.last_entry_id)"
    )
}

/// Execute one write operation inside a transaction.
pub(crate) async fn execute_op(
    txn: &Transaction<'_>,
    op: &WriteOp,
) -> std::result::Result<u64, tokio_postgres::Error> {
    match op {
        WriteOp::InsertEntry {
            entry_id,
            context_id,
            specimen_id,
            created_by,
            status,
        } => {
            txn.execute(
                &op.sql(),
                &[entry_id, context_id, specimen_id, created_by, status],
            )
            .await
        }
        WriteOp::UpsertSingle {
            entry_id, value, ..
        }
        | WriteOp::UpsertMulti {
            entry_id, value, ..
        } => txn.execute(&op.sql(), &[entry_id, value]).await,
    }
}

/// Render a sanitized field value as the text that gets stored.
///
/// Strings pass through unchanged; other scalars use their JSON rendering
/// (numbers and booleans come out of the legacy export unquoted).
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_entry_sql() {
        let op = WriteOp::InsertEntry {
            entry_id: 1,
            context_id: 2,
            specimen_id: "42".to_string(),
            created_by: "migration".to_string(),
            status: ENTRY_STATUS_COMPLETE.to_string(),
        };
        let sql = op.sql();
        assert!(sql.starts_with("INSERT INTO annotation_entry"));
        assert!(sql.contains("entry_id, context_id, specimen_id, created_by, status"));
    }

    #[test]
    fn test_upsert_single_sql_conflicts_on_entry_id() {
        let op = WriteOp::UpsertSingle {
            table: "annotation_diagnosis".to_string(),
            column: "diagnosis_code".to_string(),
            entry_id: 7,
            value: "C50.9".to_string(),
        };
        let sql = op.sql();
        assert!(sql.contains("INSERT INTO annotation_diagnosis (entry_id, diagnosis_code)"));
        assert!(sql.contains("ON CONFLICT (entry_id) DO UPDATE"));
        assert!(sql.contains("diagnosis_code = EXCLUDED.diagnosis_code"));
    }

    #[test]
    fn test_upsert_multi_sql_conflicts_on_natural_key() {
        let op = WriteOp::UpsertMulti {
            table: "annotation_tissue_site".to_string(),
            column: "site_code".to_string(),
            entry_id: 7,
            value: "LUNG".to_string(),
        };
        let sql = op.sql();
        assert!(sql.contains("ON CONFLICT (entry_id, site_code) DO UPDATE"));
    }

    #[test]
    fn test_publish_sequence_sql_is_monotonic() {
        let sql = publish_sequence_sql();
        assert!(sql.contains("annotation_sequence"));
        assert!(sql.contains("GREATEST"));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("abc")), "abc");
        assert_eq!(value_text(&json!(42)), "42");
        assert_eq!(value_text(&json!(true)), "true");
    }
}
