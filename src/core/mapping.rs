//! Mapping table resolver
//!
//! Parses the declarative field-mapping CSV into typed
//! [`FieldMappingRule`]s once at startup. The resolved rule set is
//! immutable and reused for every batch in the run.
//!
//! Required columns: `Legacy Field Name`, `Target Field Name`,
//! `Target Table Name`, `Target Column Name`, `Is Multi-Select`.

use crate::domain::errors::MigrationError;
use crate::domain::mapping::{validate_identifier, Cardinality, FieldMappingRule};
use crate::domain::result::Result;
use serde::Deserialize;
use std::path::Path;

/// Raw CSV row before trimming and validation.
#[derive(Debug, Deserialize)]
struct MappingRow {
    #[serde(rename = "Legacy Field Name")]
    legacy_field: String,
    #[serde(rename = "Target Field Name")]
    target_field: String,
    #[serde(rename = "Target Table Name")]
    target_table: String,
    #[serde(rename = "Target Column Name")]
    target_column: String,
    #[serde(rename = "Is Multi-Select")]
    is_multi_select: String,
}

/// Load and resolve the field-mapping table.
///
/// Every textual sub-field is whitespace-trimmed; the multi-select flag is
/// interpreted case-insensitively ("yes" means multi-valued). Target table
/// and column names are syntax-checked here; existence in the live target
/// schema is verified separately at startup.
///
/// # Errors
///
/// Returns `Configuration` errors for a missing file, a missing required
/// column, a blank required sub-field, a malformed identifier, or a
/// duplicate legacy field name.
pub fn load_mapping_rules(path: impl AsRef<Path>) -> Result<Vec<FieldMappingRule>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MigrationError::Configuration(format!(
            "Mapping table not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| {
            MigrationError::Configuration(format!(
                "Failed to open mapping table {}: {}",
                path.display(),
                e
            ))
        })?;

    let mut rules = Vec::new();
    for (index, row) in reader.deserialize::<MappingRow>().enumerate() {
        // CSV line numbers are 1-based and the header occupies line 1.
        let line = index + 2;
        let row = row.map_err(|e| {
            MigrationError::Configuration(format!(
                "Malformed mapping row at line {line}: {e}"
            ))
        })?;
        rules.push(resolve_row(row, line)?);
    }

    check_unique_legacy_fields(&rules)?;

    tracing::info!(
        rules = rules.len(),
        path = %path.display(),
        "Mapping table resolved"
    );

    Ok(rules)
}

fn resolve_row(row: MappingRow, line: usize) -> Result<FieldMappingRule> {
    let legacy_field = row.legacy_field.trim().to_string();
    let target_field = row.target_field.trim().to_string();
    let target_table = row.target_table.trim().to_string();
    let target_column = row.target_column.trim().to_string();

    for (name, value) in [
        ("Legacy Field Name", &legacy_field),
        ("Target Field Name", &target_field),
        ("Target Table Name", &target_table),
        ("Target Column Name", &target_column),
    ] {
        if value.is_empty() {
            return Err(MigrationError::Configuration(format!(
                "Mapping row at line {line} is missing '{name}'"
            )));
        }
    }

    validate_identifier(&target_table)?;
    validate_identifier(&target_column)?;

    Ok(FieldMappingRule {
        legacy_field,
        target_field,
        target_table,
        target_column,
        cardinality: Cardinality::from_flag(&row.is_multi_select),
    })
}

fn check_unique_legacy_fields(rules: &[FieldMappingRule]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for rule in rules {
        if !seen.insert(rule.legacy_field.as_str()) {
            return Err(MigrationError::Configuration(format!(
                "Duplicate legacy field '{}' in mapping table",
                rule.legacy_field
            )));
        }
    }
    Ok(())
}

/// Split a multi-valued field into its tokens.
///
/// Splits on commas, trims each token, and drops empties, so
/// `"A, B ,,C"` yields `["A", "B", "C"]`.
pub fn split_multi_value(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
