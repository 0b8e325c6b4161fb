//! Update path of the migration engine
//!
//! Update candidates already have a target entry identifier; the engine
//! reconciles them field by field, reading the stored value and writing
//! only what changed. Multi-valued fields gain missing tokens and never
//! lose existing ones. The failure unit is the individual record: each
//! record's writes run inside a savepoint on the batch transaction, so a
//! reconciliation error rolls back only that record and the run moves on.

use crate::adapters::postgresql::PostgresClient;
use crate::core::failure::FailureLog;
use crate::core::mapping::split_multi_value;
use crate::core::migrate::summary::RunSummary;
use crate::core::migrate::{execute_op, value_text, WriteOp};
use crate::core::sanitize::has_value;
use crate::domain::{FieldMappingRule, MigrationError, Result, SourceRecord};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_postgres::{GenericClient, Transaction};

/// True when a single-valued field must be written.
///
/// A write is needed when no stored value exists or the stored value
/// differs from the incoming one after trimming. Equal values are a
/// no-op: no operation is emitted, the record still counts as updated.
pub fn single_needs_write(current: Option<&str>, incoming: &str) -> bool {
    match current {
        Some(stored) => stored.trim() != incoming.trim(),
        None => true,
    }
}

/// Tokens of the incoming multi-value not yet present in the store.
///
/// Comparison is trimmed; repeated incoming tokens are deduplicated.
/// Stale stored tokens are left alone, never deleted.
pub fn missing_tokens(existing: &[String], incoming: &str) -> Vec<String> {
    let stored: HashSet<&str> = existing.iter().map(|s| s.trim()).collect();
    let mut seen = HashSet::new();
    split_multi_value(incoming)
        .into_iter()
        .filter(|token| !stored.contains(token.as_str()) && seen.insert(token.clone()))
        .collect()
}

/// Read current state and decide the write set for one update candidate.
async fn plan_update_ops<C>(
    db: &C,
    record: &SourceRecord,
    entry_id: i64,
    rules: &[FieldMappingRule],
) -> std::result::Result<Vec<WriteOp>, tokio_postgres::Error>
where
    C: GenericClient + Sync,
{
    let mut ops = Vec::new();

    for rule in rules {
        let Some(value) = record.fields.get(&rule.legacy_field) else {
            continue;
        };
        if !has_value(value) {
            continue;
        }
        let incoming = value_text(value);

        let read_sql = format!(
            "SELECT {column} FROM {table} WHERE entry_id = $1",
            column = rule.target_column,
            table = rule.target_table,
        );

        if rule.is_multi() {
            let rows = db.query(&read_sql, &[&entry_id]).await?;
            let existing: Vec<String> = rows
                .iter()
                .filter_map(|row| row.get::<_, Option<String>>(0))
                .collect();

            for token in missing_tokens(&existing, &incoming) {
                ops.push(WriteOp::UpsertMulti {
                    table: rule.target_table.clone(),
                    column: rule.target_column.clone(),
                    entry_id,
                    value: token,
                });
            }
        } else {
            let row = db.query_opt(&read_sql, &[&entry_id]).await?;
            let current: Option<String> = row.and_then(|r| r.get(0));

            if single_needs_write(current.as_deref(), &incoming) {
                ops.push(WriteOp::UpsertSingle {
                    table: rule.target_table.clone(),
                    column: rule.target_column.clone(),
                    entry_id,
                    value: incoming.clone(),
                });
            }
        }
    }

    Ok(ops)
}

/// Reconciles update candidates record by record.
pub struct UpdateWriter {
    client: Arc<PostgresClient>,
    batch_size: usize,
    dry_run: bool,
}

impl UpdateWriter {
    pub fn new(client: Arc<PostgresClient>, batch_size: usize, dry_run: bool) -> Self {
        Self {
            client,
            batch_size,
            dry_run,
        }
    }

    /// Consume one page's update candidates.
    ///
    /// Records are committed together in batches of `batch_size`, but the
    /// batch boundary has no bearing on failure isolation: a failing
    /// record is rolled back alone via its savepoint and logged, and its
    /// siblings commit normally.
    pub async fn process(
        &self,
        records: &[SourceRecord],
        rules: &[FieldMappingRule],
        failures: &mut FailureLog,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if self.dry_run {
            return self.plan_only(records, rules, summary).await;
        }

        for chunk in records.chunks(self.batch_size) {
            let mut conn = self.client.get_connection().await?;
            let mut txn = conn
                .transaction()
                .await
                .map_err(|e| MigrationError::Database(e.to_string()))?;

            for record in chunk {
                let savepoint = txn
                    .savepoint("record")
                    .await
                    .map_err(|e| MigrationError::Database(e.to_string()))?;

                match reconcile_record(&savepoint, record, rules).await {
                    Ok(op_count) => {
                        savepoint
                            .commit()
                            .await
                            .map_err(|e| MigrationError::Database(e.to_string()))?;
                        summary.add_updated(1);
                        if op_count == 0 {
                            tracing::debug!(
                                record = %record.label,
                                "Stored values already current; no writes"
                            );
                        }
                    }
                    Err(err) => {
                        savepoint
                            .rollback()
                            .await
                            .map_err(|e| MigrationError::Database(e.to_string()))?;
                        failures.record(&record.label, &err.to_string())?;
                        summary.add_failed(1);
                    }
                }
            }

            txn.commit().await.map_err(|e| {
                MigrationError::Database(format!("Failed to commit update batch: {e}"))
            })?;
        }

        Ok(())
    }

    /// Dry run: read and plan against the live store, write nothing.
    async fn plan_only(
        &self,
        records: &[SourceRecord],
        rules: &[FieldMappingRule],
        summary: &mut RunSummary,
    ) -> Result<()> {
        let conn = self.client.get_connection().await?;

        for record in records {
            let entry_id = record.entry_id.unwrap_or_default();
            let ops = plan_update_ops(&**conn, record, entry_id, rules)
                .await
                .map_err(|e| MigrationError::Database(e.to_string()))?;
            tracing::info!(
                record = %record.label,
                operations = ops.len(),
                "DRY RUN: would reconcile record"
            );
            summary.add_updated(1);
        }

        Ok(())
    }
}

/// Reconcile one record inside its savepoint.
async fn reconcile_record(
    txn: &Transaction<'_>,
    record: &SourceRecord,
    rules: &[FieldMappingRule],
) -> Result<usize> {
    let entry_id = record.entry_id.ok_or_else(|| MigrationError::Reconciliation {
        label: record.label.clone(),
        message: "record has no target entry identifier".to_string(),
    })?;

    let to_reconciliation = |e: tokio_postgres::Error| MigrationError::Reconciliation {
        label: record.label.clone(),
        message: e.to_string(),
    };

    let ops = plan_update_ops(&*txn, record, entry_id, rules)
        .await
        .map_err(to_reconciliation)?;

    for op in &ops {
        execute_op(txn, op).await.map_err(to_reconciliation)?;
    }

    Ok(ops.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_needs_write_when_absent() {
        assert!(single_needs_write(None, "C50.9"));
    }

    #[test]
    fn test_single_needs_write_when_different() {
        assert!(single_needs_write(Some("C50.1"), "C50.9"));
    }

    #[test]
    fn test_single_no_write_when_equal_trimmed() {
        assert!(!single_needs_write(Some("C50.9"), "C50.9"));
        assert!(!single_needs_write(Some("  C50.9 "), "C50.9"));
        assert!(!single_needs_write(Some("C50.9"), " C50.9  "));
    }

    #[test]
    fn test_missing_tokens_inserts_only_new() {
        let existing = vec!["A".to_string(), " B ".to_string()];
        assert_eq!(missing_tokens(&existing, "A, B ,,C"), vec!["C"]);
    }

    #[test]
    fn test_missing_tokens_never_deletes() {
        // Stale stored token D is simply absent from the result.
        let existing = vec!["D".to_string()];
        assert_eq!(missing_tokens(&existing, "A"), vec!["A"]);
    }

    #[test]
    fn test_missing_tokens_deduplicates_incoming() {
        let existing: Vec<String> = Vec::new();
        assert_eq!(missing_tokens(&existing, "A,A,B"), vec!["A", "B"]);
    }

    #[test]
    fn test_missing_tokens_empty_incoming() {
        let existing = vec!["A".to_string()];
        assert!(missing_tokens(&existing, " , ").is_empty());
    }
}
