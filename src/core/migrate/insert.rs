//! Insert path of the migration engine
//!
//! Insert candidates are planned record by record (allocating an entry
//! identifier, resolving the protocol context, mapping every populated
//! legacy field to upsert operations) and applied in fixed-size units. A
//! unit commits or rolls back atomically together with the sequence
//! high-water publish; a record that fails context resolution is excluded
//! from its unit before application and never forces a rollback of its
//! siblings.

use crate::adapters::postgresql::PostgresClient;
use crate::core::failure::FailureLog;
use crate::core::mapping::split_multi_value;
use crate::core::migrate::summary::RunSummary;
use crate::core::migrate::{
    execute_op, publish_sequence_sql, value_text, WriteOp, ENTRY_STATUS_COMPLETE,
};
use crate::core::sanitize::has_value;
use crate::core::sequence::SequenceAllocator;
use crate::domain::{ContextMap, FieldMappingRule, MigrationError, Result, SourceRecord};
use std::collections::HashSet;
use std::sync::Arc;

/// The planned write set for one insert candidate.
#[derive(Debug, Clone)]
pub struct RecordPlan {
    /// Label used for failure-log entries.
    pub label: String,
    /// Entry identifier allocated to this record.
    pub entry_id: i64,
    /// Ordered operations: the entry row first, then one op per value.
    pub ops: Vec<WriteOp>,
}

/// Plan the write operations for a single insert candidate.
///
/// The entry identifier must already be allocated; allocation happens
/// before planning so a record excluded here still consumes its id.
///
/// # Errors
///
/// Returns `ContextResolution` when the record's protocol identifier has
/// no entry in the context map.
pub fn plan_insert_record(
    record: &SourceRecord,
    entry_id: i64,
    context: &ContextMap,
    rules: &[FieldMappingRule],
    created_by: &str,
) -> Result<RecordPlan> {
    let context_id = context.resolve(&record.protocol_id).ok_or_else(|| {
        MigrationError::ContextResolution {
            label: record.label.clone(),
            protocol_id: record.protocol_id.clone(),
        }
    })?;

    let mut ops = vec![WriteOp::InsertEntry {
        entry_id,
        context_id,
        specimen_id: record.specimen_id.clone(),
        created_by: created_by.to_string(),
        status: ENTRY_STATUS_COMPLETE.to_string(),
    }];

    for rule in rules {
        let Some(value) = record.fields.get(&rule.legacy_field) else {
            continue;
        };
        if !has_value(value) {
            continue;
        }
        let text = value_text(value);

        if rule.is_multi() {
            let mut seen = HashSet::new();
            for token in split_multi_value(&text) {
                if seen.insert(token.clone()) {
                    ops.push(WriteOp::UpsertMulti {
                        table: rule.target_table.clone(),
                        column: rule.target_column.clone(),
                        entry_id,
                        value: token,
                    });
                }
            }
        } else {
            ops.push(WriteOp::UpsertSingle {
                table: rule.target_table.clone(),
                column: rule.target_column.clone(),
                entry_id,
                value: text,
            });
        }
    }

    Ok(RecordPlan {
        label: record.label.clone(),
        entry_id,
        ops,
    })
}

/// Applies insert candidates in atomic units of `batch_size` records.
pub struct InsertWriter {
    client: Arc<PostgresClient>,
    batch_size: usize,
    created_by: String,
    dry_run: bool,
}

impl InsertWriter {
    pub fn new(
        client: Arc<PostgresClient>,
        batch_size: usize,
        created_by: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            batch_size,
            created_by: created_by.into(),
            dry_run,
        }
    }

    /// Consume one page's insert candidates.
    ///
    /// Every record consumes an entry identifier, even if it is excluded
    /// for a missing context. Units are flushed at the batch-size
    /// threshold and at end of input.
    pub async fn process(
        &self,
        records: &[SourceRecord],
        context: &ContextMap,
        rules: &[FieldMappingRule],
        sequence: &mut SequenceAllocator,
        failures: &mut FailureLog,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let mut pending: Vec<RecordPlan> = Vec::new();

        for record in records {
            let entry_id = sequence.next();
            match plan_insert_record(record, entry_id, context, rules, &self.created_by) {
                Ok(plan) => pending.push(plan),
                Err(err) if err.is_recoverable() => {
                    failures.record(&record.label, &err.to_string())?;
                    summary.add_failed(1);
                }
                Err(err) => return Err(err),
            }

            if pending.len() >= self.batch_size {
                self.apply_unit(&pending, sequence, failures, summary)
                    .await?;
                pending.clear();
            }
        }

        if !pending.is_empty() {
            self.apply_unit(&pending, sequence, failures, summary)
                .await?;
        }

        Ok(())
    }

    /// Apply one pending unit atomically.
    ///
    /// The unit's operations and the sequence high-water publish share one
    /// transaction. A store-level failure rolls the whole unit back; every
    /// member is then logged and the run continues with the next unit.
    async fn apply_unit(
        &self,
        plans: &[RecordPlan],
        sequence: &mut SequenceAllocator,
        failures: &mut FailureLog,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if self.dry_run {
            let op_count: usize = plans.iter().map(|p| p.ops.len()).sum();
            tracing::info!(
                records = plans.len(),
                operations = op_count,
                "DRY RUN: would insert unit"
            );
            summary.add_inserted(plans.len());
            return Ok(());
        }

        let high_water = sequence.high_water();
        let mut conn = self.client.get_connection().await?;

        let applied: std::result::Result<(), tokio_postgres::Error> = async {
            let txn = conn.transaction().await?;
            for plan in plans {
                for op in &plan.ops {
                    execute_op(&txn, op).await?;
                }
            }
            txn.execute(&publish_sequence_sql(), &[&high_water]).await?;
            txn.commit().await
        }
        .await;

        match applied {
            Ok(()) => {
                sequence.mark_published();
                summary.add_inserted(plans.len());
                tracing::debug!(
                    records = plans.len(),
                    high_water = high_water,
                    "Insert unit committed"
                );
                Ok(())
            }
            Err(e) => {
                let err = MigrationError::StoreExecution(e.to_string());
                tracing::error!(
                    records = plans.len(),
                    error = %err,
                    "Insert unit rolled back"
                );
                for plan in plans {
                    failures.record(&plan.label, &err.to_string())?;
                }
                summary.add_failed(plans.len());
                Ok(())
            }
        }
    }
}
