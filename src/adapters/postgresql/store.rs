//! Target schema reads
//!
//! Read-side queries against the annotation schema: sequence seeding,
//! context resolution, mapping-rule verification and the counters shown
//! by the status command. Writes go through the engine's own
//! transactions, not through this type.

use crate::adapters::postgresql::PostgresClient;
use crate::core::migrate::{CONTEXT_TABLE, ENTRY_TABLE, SEQUENCE_TABLE};
use crate::domain::{ContextMap, FieldMappingRule, MigrationError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Read access to the target annotation schema.
pub struct TargetStore {
    client: Arc<PostgresClient>,
}

impl TargetStore {
    pub fn new(client: Arc<PostgresClient>) -> Self {
        Self { client }
    }

    /// Current maximum entry identifier, or 0 when the entry table is empty.
    ///
    /// Seeds the sequence allocator at the start of a run.
    pub async fn max_entry_id(&self) -> Result<i64> {
        let sql = format!("SELECT COALESCE(MAX(entry_id), 0) FROM {ENTRY_TABLE}");
        let row = self
            .client
            .query_opt(&sql, &[])
            .await?
            .ok_or_else(|| MigrationError::Database("Sequence seed query returned no row".into()))?;
        Ok(row.get(0))
    }

    /// Resolve a set of protocol identifiers to target context identifiers.
    ///
    /// Protocols without a context row are simply absent from the map; the
    /// insert planner turns that absence into a per-record failure.
    pub async fn fetch_context_map(&self, protocols: &[String]) -> Result<ContextMap> {
        if protocols.is_empty() {
            return Ok(ContextMap::new());
        }

        let sql = format!(
            "SELECT protocol_id, context_id FROM {CONTEXT_TABLE} WHERE protocol_id = ANY($1)"
        );
        let rows = self.client.query(&sql, &[&protocols]).await?;

        let mut map = ContextMap::new();
        for row in rows {
            let protocol: String = row.get(0);
            let context: i64 = row.get(1);
            map.insert(protocol, context);
        }

        tracing::debug!(
            requested = protocols.len(),
            resolved = map.len(),
            "Context map fetched"
        );
        Ok(map)
    }

    /// Columns of every table in the public schema.
    async fn load_schema_columns(&self) -> Result<HashMap<String, HashSet<String>>> {
        let rows = self
            .client
            .query(
                "SELECT table_name, column_name FROM information_schema.columns \
                 WHERE table_schema = 'public'",
                &[],
            )
            .await?;

        let mut columns: HashMap<String, HashSet<String>> = HashMap::new();
        for row in rows {
            let table: String = row.get(0);
            let column: String = row.get(1);
            columns.entry(table).or_default().insert(column);
        }
        Ok(columns)
    }

    /// Verify every mapping rule against the live target schema.
    ///
    /// Rules name tables and columns that end up spliced into statement
    /// text, so each one must resolve to a real column before the run
    /// starts. The fixed engine tables are checked here too.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` naming the first missing table or column.
    pub async fn validate_rules(&self, rules: &[FieldMappingRule]) -> Result<()> {
        let columns = self.load_schema_columns().await?;

        for table in [ENTRY_TABLE, SEQUENCE_TABLE, CONTEXT_TABLE] {
            if !columns.contains_key(table) {
                return Err(MigrationError::Configuration(format!(
                    "Required table '{}' not found in target schema",
                    table
                )));
            }
        }

        for rule in rules {
            let Some(table_columns) = columns.get(&rule.target_table) else {
                return Err(MigrationError::Configuration(format!(
                    "Mapping rule '{}' targets unknown table '{}'",
                    rule.legacy_field, rule.target_table
                )));
            };
            for column in [rule.target_column.as_str(), "entry_id"] {
                if !table_columns.contains(column) {
                    return Err(MigrationError::Configuration(format!(
                        "Mapping rule '{}' targets missing column '{}.{}'",
                        rule.legacy_field, rule.target_table, column
                    )));
                }
            }
        }

        Ok(())
    }

    /// Number of rows in the entry table.
    pub async fn entry_count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {ENTRY_TABLE}");
        let rows = self.client.query(&sql, &[]).await?;
        Ok(rows.first().map(|r| r.get(0)).unwrap_or(0))
    }

    /// Published sequence high-water mark, if the counter row exists.
    pub async fn sequence_value(&self) -> Result<Option<i64>> {
        let sql = format!("SELECT last_entry_id FROM {SEQUENCE_TABLE} WHERE id = 1");
        let row = self.client.query_opt(&sql, &[]).await?;
        Ok(row.map(|r| r.get(0)))
    }
}
