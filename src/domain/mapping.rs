//! Field mapping rule types
//!
//! A mapping rule describes where one legacy field lives in the EAV target
//! schema. Rules are parsed once at startup from the mapping table (see
//! [`crate::core::mapping`]) and are immutable for the run.

use crate::domain::errors::MigrationError;
use crate::domain::result::Result;
use std::fmt;

/// Whether a legacy field carries one scalar value or a comma-delimited set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One scalar value, stored in a column keyed by the entry id.
    Single,
    /// A comma-delimited set; one row per token keyed by (entry id, value).
    Multi,
}

impl Cardinality {
    /// Parse the mapping table's multi-select flag.
    ///
    /// Multi-valued only when the flag, trimmed and case-insensitively,
    /// is the literal token "yes". Anything else is single-valued.
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("yes") {
            Cardinality::Multi
        } else {
            Cardinality::Single
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Single => write!(f, "single"),
            Cardinality::Multi => write!(f, "multi"),
        }
    }
}

/// One resolved field mapping rule.
///
/// All textual sub-fields are whitespace-trimmed at parse time. The target
/// table and column names are syntax-checked at parse time and verified
/// against the live target schema at startup, so they can be spliced into
/// statements safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMappingRule {
    /// Legacy field name, the lookup key into source records.
    pub legacy_field: String,
    /// Display name of the field in the target system.
    pub target_field: String,
    /// Target value table.
    pub target_table: String,
    /// Target column within the value table.
    pub target_column: String,
    /// Single- or multi-valued.
    pub cardinality: Cardinality,
}

impl FieldMappingRule {
    pub fn is_multi(&self) -> bool {
        self.cardinality == Cardinality::Multi
    }
}

/// Validate a SQL identifier coming from the mapping table.
///
/// Only lowercase identifiers of the form `[a-z_][a-z0-9_]*` are accepted.
/// Together with the startup check against the live schema this keeps
/// mapping-table strings out of the statement text unvetted.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(MigrationError::Configuration(format!(
            "Invalid target identifier '{name}': identifiers must match [a-z_][a-z0-9_]*"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("yes", Cardinality::Multi; "plain yes")]
    #[test_case("YES", Cardinality::Multi; "uppercase")]
    #[test_case(" Yes ", Cardinality::Multi; "padded mixed case")]
    #[test_case("no", Cardinality::Single; "plain no")]
    #[test_case("", Cardinality::Single; "empty flag")]
    #[test_case("y", Cardinality::Single; "abbreviation is not yes")]
    fn test_cardinality_from_flag(flag: &str, expected: Cardinality) {
        assert_eq!(Cardinality::from_flag(flag), expected);
    }

    #[test]
    fn test_validate_identifier_accepts_plain_names() {
        assert!(validate_identifier("annotation_diagnosis").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("col2").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_injection_shapes() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2col").is_err());
        assert!(validate_identifier("Name").is_err());
        assert!(validate_identifier("tab le").is_err());
        assert!(validate_identifier("x; drop table y").is_err());
        assert!(validate_identifier("a\"b").is_err());
    }

    #[test]
    fn test_rule_is_multi() {
        let rule = FieldMappingRule {
            legacy_field: "tissue_sites".to_string(),
            target_field: "Tissue Sites".to_string(),
            target_table: "annotation_tissue_site".to_string(),
            target_column: "site_code".to_string(),
            cardinality: Cardinality::Multi,
        };
        assert!(rule.is_multi());
    }
}
