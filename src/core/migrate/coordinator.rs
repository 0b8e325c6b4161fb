//! Migration run coordination
//!
//! The coordinator owns the full run: it connects to the store, loads and
//! verifies the mapping rules, seeds the entry-id allocator from the
//! store's high-water mark, then drives the extraction cursor page by
//! page through sanitize, classify, and the two write paths. A run is
//! resumable by construction: rerunning after a crash re-reads the
//! published sequence value and upserts converge on the same rows.

use crate::adapters::postgresql::{PostgresClient, SourceCursor, TargetStore};
use crate::config::AppConfig;
use crate::core::classify::classify;
use crate::core::failure::{FailureLog, FailureLogMode};
use crate::core::mapping::load_mapping_rules;
use crate::core::migrate::insert::InsertWriter;
use crate::core::migrate::summary::RunSummary;
use crate::core::migrate::update::UpdateWriter;
use crate::core::sanitize::sanitize_record;
use crate::core::sequence::SequenceAllocator;
use crate::domain::{ContextMap, FieldMappingRule, Result, SourceRecord};
use std::sync::Arc;
use std::time::Instant;

/// Distinct protocol identifiers across a set of records, in first-seen
/// order. The context lookup is fetched once per page from this list.
fn distinct_protocols(records: &[SourceRecord]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.protocol_id.clone()))
        .map(|r| r.protocol_id.clone())
        .collect()
}

/// Coordinates one end-to-end migration run.
pub struct MigrationCoordinator {
    config: AppConfig,
    client: Arc<PostgresClient>,
    store: TargetStore,
    rules: Vec<FieldMappingRule>,
}

impl MigrationCoordinator {
    /// Connect to the store, load the mapping rules and verify them
    /// against the live target schema.
    ///
    /// # Errors
    ///
    /// Fails when the database is unreachable, the mapping CSV is
    /// malformed, or a rule names a table or column the target schema
    /// does not have.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let client = Arc::new(PostgresClient::new(&config.postgresql)?);
        client.test_connection().await?;

        let store = TargetStore::new(Arc::clone(&client));

        let rules = load_mapping_rules(&config.mapping.path)?;
        store.validate_rules(&rules).await?;
        tracing::info!(
            rules = rules.len(),
            path = %config.mapping.path.display(),
            "Mapping rules loaded and verified against target schema"
        );

        Ok(Self {
            config,
            client,
            store,
            rules,
        })
    }

    /// Run the migration to completion and return the final counters.
    pub async fn execute(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let dry_run = self.config.application.dry_run;

        if dry_run {
            tracing::info!("DRY RUN mode: planning only, no writes will be issued");
        }

        let max_entry_id = self.store.max_entry_id().await?;
        let mut sequence = SequenceAllocator::seed(max_entry_id);
        tracing::info!(
            high_water = max_entry_id,
            "Entry identifier sequence seeded from target store"
        );

        let migration = &self.config.migration;
        let mut insert_failures =
            FailureLog::open(&migration.insert_failure_log, FailureLogMode::Truncate)?;
        let mut update_failures =
            FailureLog::open(&migration.update_failure_log, FailureLogMode::Append)?;

        let insert_writer = InsertWriter::new(
            Arc::clone(&self.client),
            migration.batch_size,
            migration.created_by.clone(),
            dry_run,
        );
        let update_writer = UpdateWriter::new(Arc::clone(&self.client), migration.batch_size, dry_run);

        let mut cursor = SourceCursor::new(Arc::clone(&self.client), self.config.source.clone());
        let mut summary = RunSummary::new();

        while let Some(page) = cursor.next_page().await? {
            summary.add_page();
            summary.add_processed(page.len());

            let mut records = page;
            for record in &mut records {
                sanitize_record(record);
            }

            let batch = classify(records);
            tracing::debug!(
                to_insert = batch.to_insert.len(),
                to_update = batch.to_update.len(),
                "Page classified"
            );

            let context = if batch.to_insert.is_empty() {
                ContextMap::new()
            } else {
                let protocols = distinct_protocols(&batch.to_insert);
                self.store.fetch_context_map(&protocols).await?
            };

            insert_writer
                .process(
                    &batch.to_insert,
                    &context,
                    &self.rules,
                    &mut sequence,
                    &mut insert_failures,
                    &mut summary,
                )
                .await?;

            update_writer
                .process(&batch.to_update, &self.rules, &mut update_failures, &mut summary)
                .await?;

            summary.log_progress();
        }

        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();

        if insert_failures.entries() > 0 {
            tracing::warn!(
                count = insert_failures.entries(),
                path = %insert_failures.path().display(),
                "Insert failures recorded"
            );
        }
        if update_failures.entries() > 0 {
            tracing::warn!(
                count = update_failures.entries(),
                path = %update_failures.path().display(),
                "Update failures recorded"
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_protocols_preserves_first_seen_order() {
        let records = vec![
            SourceRecord::new("A", "1", "P-2"),
            SourceRecord::new("B", "2", "P-1"),
            SourceRecord::new("C", "3", "P-2"),
        ];
        assert_eq!(distinct_protocols(&records), vec!["P-2", "P-1"]);
    }

    #[test]
    fn test_distinct_protocols_empty() {
        assert!(distinct_protocols(&[]).is_empty());
    }
}
