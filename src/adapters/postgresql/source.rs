//! Legacy source extraction cursor
//!
//! The legacy store keeps one flat form row per specimen. The cursor
//! pages through a join of the specimen and form tables in stable
//! specimen order and hands each page to the engine as `SourceRecord`s,
//! or signals exhaustion with `None`.
//!
//! The form tables vary per deployment, so rows are fetched through
//! `row_to_json` and decoded dynamically instead of binding a fixed
//! column list.

use crate::adapters::postgresql::PostgresClient;
use crate::config::schema::SourceConfig;
use crate::domain::{MigrationError, Result, SourceRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Columns with engine meaning; everything else on the row is a legacy
/// field looked up through the mapping rules.
const LABEL_COLUMN: &str = "barcode";
const SPECIMEN_COLUMN: &str = "specimen_id";
const PROTOCOL_COLUMN: &str = "protocol_id";
const ENTRY_ID_COLUMN: &str = "entry_id";

/// Render a scalar JSON value as text, or `None` for null.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decode one `row_to_json` row into a source record.
///
/// The label, specimen and protocol columns are required. The entry
/// identifier is optional: null, absence or an empty string all mean the
/// record has not been migrated yet.
pub fn record_from_json(row: &Value) -> Result<SourceRecord> {
    let object = row.as_object().ok_or_else(|| {
        MigrationError::Serialization("Source row is not a JSON object".to_string())
    })?;

    let required = |column: &str| -> Result<String> {
        object
            .get(column)
            .and_then(scalar_text)
            .ok_or_else(|| {
                MigrationError::Serialization(format!(
                    "Source row is missing required column '{}'",
                    column
                ))
            })
    };

    let label = required(LABEL_COLUMN)?;
    let specimen_id = required(SPECIMEN_COLUMN)?;
    let protocol_id = required(PROTOCOL_COLUMN)?;

    let entry_id = match object.get(ENTRY_ID_COLUMN) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.trim().parse::<i64>().map_err(|_| {
            MigrationError::Serialization(format!(
                "Source row '{}' has non-numeric entry identifier '{}'",
                label, s
            ))
        })?),
        Some(other) => {
            return Err(MigrationError::Serialization(format!(
                "Source row '{}' has unexpected entry identifier value {}",
                label, other
            )))
        }
    };

    let fields: BTreeMap<String, Value> = object
        .iter()
        .filter(|(key, _)| {
            ![
                LABEL_COLUMN,
                SPECIMEN_COLUMN,
                PROTOCOL_COLUMN,
                ENTRY_ID_COLUMN,
            ]
            .contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut record = SourceRecord::new(label, specimen_id, protocol_id);
    record.entry_id = entry_id;
    record.fields = fields;
    Ok(record)
}

/// Paginated cursor over the legacy specimen/form join.
pub struct SourceCursor {
    client: Arc<PostgresClient>,
    config: SourceConfig,
    offset: i64,
    exhausted: bool,
}

impl SourceCursor {
    pub fn new(client: Arc<PostgresClient>, config: SourceConfig) -> Self {
        Self {
            client,
            config,
            offset: 0,
            exhausted: false,
        }
    }

    fn page_sql(&self) -> String {
        format!(
            "SELECT row_to_json(t) FROM ( \
               SELECT s.{LABEL_COLUMN}, s.{PROTOCOL_COLUMN}, f.* \
               FROM {form} f \
               JOIN {specimen} s ON s.{SPECIMEN_COLUMN} = f.{SPECIMEN_COLUMN} \
               ORDER BY f.{SPECIMEN_COLUMN} \
             ) t LIMIT $1 OFFSET $2",
            form = self.config.form_table,
            specimen = self.config.specimen_table,
        )
    }

    /// Fetch the next page of records, or `None` when the source is
    /// exhausted. Pages come back in monotonically increasing offset
    /// order.
    pub async fn next_page(&mut self) -> Result<Option<Vec<SourceRecord>>> {
        if self.exhausted {
            return Ok(None);
        }

        let limit = self.config.page_size as i64;
        let rows = self
            .client
            .query(&self.page_sql(), &[&limit, &self.offset])
            .await?;

        if rows.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        if (rows.len() as i64) < limit {
            self.exhausted = true;
        }
        self.offset += rows.len() as i64;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let json: Value = row.get(0);
            records.push(record_from_json(&json)?);
        }

        tracing::debug!(
            records = records.len(),
            offset = self.offset,
            "Source page fetched"
        );
        Ok(Some(records))
    }

    /// Total rows in the legacy join.
    pub async fn total_count(&self) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {form} f \
             JOIN {specimen} s ON s.{SPECIMEN_COLUMN} = f.{SPECIMEN_COLUMN}",
            form = self.config.form_table,
            specimen = self.config.specimen_table,
        );
        let rows = self.client.query(&sql, &[]).await?;
        Ok(rows.first().map(|r| r.get(0)).unwrap_or(0))
    }

    /// Rows in the legacy join not yet carrying a target entry identifier.
    pub async fn unmigrated_count(&self) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {form} f \
             JOIN {specimen} s ON s.{SPECIMEN_COLUMN} = f.{SPECIMEN_COLUMN} \
             WHERE f.{ENTRY_ID_COLUMN} IS NULL",
            form = self.config.form_table,
            specimen = self.config.specimen_table,
        );
        let rows = self.client.query(&sql, &[]).await?;
        Ok(rows.first().map(|r| r.get(0)).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_json_full_row() {
        let row = json!({
            "barcode": "SPEC-001",
            "specimen_id": 42,
            "protocol_id": "P-1",
            "entry_id": 17,
            "diagnosis": "C50.9",
            "tissue_sites": "A,B"
        });

        let record = record_from_json(&row).unwrap();
        assert_eq!(record.label, "SPEC-001");
        assert_eq!(record.specimen_id, "42");
        assert_eq!(record.protocol_id, "P-1");
        assert_eq!(record.entry_id, Some(17));
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields["diagnosis"], json!("C50.9"));
    }

    #[test]
    fn test_record_from_json_null_entry_id_is_insert_candidate() {
        let row = json!({
            "barcode": "SPEC-002",
            "specimen_id": "43",
            "protocol_id": "P-1",
            "entry_id": null
        });

        let record = record_from_json(&row).unwrap();
        assert_eq!(record.entry_id, None);
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_record_from_json_blank_entry_id_is_insert_candidate() {
        let row = json!({
            "barcode": "SPEC-003",
            "specimen_id": "44",
            "protocol_id": "P-1",
            "entry_id": "  "
        });

        assert_eq!(record_from_json(&row).unwrap().entry_id, None);
    }

    #[test]
    fn test_record_from_json_numeric_string_entry_id() {
        let row = json!({
            "barcode": "SPEC-004",
            "specimen_id": "45",
            "protocol_id": "P-1",
            "entry_id": " 99 "
        });

        assert_eq!(record_from_json(&row).unwrap().entry_id, Some(99));
    }

    #[test]
    fn test_record_from_json_missing_required_column() {
        let row = json!({ "barcode": "SPEC-005", "specimen_id": "46" });

        let err = record_from_json(&row).unwrap_err();
        assert!(err.to_string().contains("protocol_id"));
    }

    #[test]
    fn test_record_from_json_rejects_non_object() {
        assert!(record_from_json(&json!(["not", "an", "object"])).is_err());
    }
}
