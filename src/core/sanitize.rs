//! Value sanitization
//!
//! Legacy exports encode "no value" in several shapes: SQL NULL, empty
//! strings, and the literal texts "null" and "none" left behind by earlier
//! tooling. The sanitizer collapses all of them to a canonical empty string
//! in place so the rest of the engine only has to test for emptiness once.

use crate::domain::SourceRecord;
use serde_json::Value;

/// True when a raw value should be treated as carrying no data.
///
/// A value is empty-like if it is JSON null, or a string that after
/// trimming and lower-casing is empty or equals "null" or "none".
/// Non-string, non-null values are never empty-like.
pub fn is_empty_like(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let normalized = s.trim().to_lowercase();
            normalized.is_empty() || normalized == "null" || normalized == "none"
        }
        _ => false,
    }
}

/// Replace every empty-like field value with the canonical empty string.
///
/// Mutates the record in place. Idempotent: the canonical empty string is
/// itself empty-like and maps to itself.
pub fn sanitize_record(record: &mut SourceRecord) {
    for value in record.fields.values_mut() {
        if is_empty_like(value) {
            *value = Value::String(String::new());
        }
    }
}

/// True when a sanitized field value carries data worth writing.
pub fn has_value(value: &Value) -> bool {
    !is_empty_like(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!(null), true; "json null")]
    #[test_case(json!(""), true; "empty string")]
    #[test_case(json!("   "), true; "whitespace only")]
    #[test_case(json!("null"), true; "literal null")]
    #[test_case(json!("NULL"), true; "uppercase null")]
    #[test_case(json!(" None "), true; "padded none")]
    #[test_case(json!("0"), false; "zero string")]
    #[test_case(json!("nil"), false; "nil is data")]
    #[test_case(json!(0), false; "number zero")]
    #[test_case(json!(false), false; "boolean false")]
    #[test_case(json!(["null"]), false; "array is not empty-like")]
    fn test_is_empty_like(value: Value, expected: bool) {
        assert_eq!(is_empty_like(&value), expected);
    }

    #[test]
    fn test_sanitize_record_normalizes_in_place() {
        let mut record = SourceRecord::new("SPEC-001", "1", "P-1")
            .with_field("a", json!(null))
            .with_field("b", json!("  None "))
            .with_field("c", json!("kept"))
            .with_field("d", json!(42));

        sanitize_record(&mut record);

        assert_eq!(record.fields["a"], json!(""));
        assert_eq!(record.fields["b"], json!(""));
        assert_eq!(record.fields["c"], json!("kept"));
        assert_eq!(record.fields["d"], json!(42));
    }

    #[test]
    fn test_sanitize_record_is_idempotent() {
        let mut record = SourceRecord::new("SPEC-001", "1", "P-1")
            .with_field("a", json!(null))
            .with_field("b", json!("value"))
            .with_field("c", json!("NULL"));

        sanitize_record(&mut record);
        let once = record.clone();
        sanitize_record(&mut record);

        assert_eq!(record, once);
    }

    #[test]
    fn test_has_value() {
        assert!(has_value(&json!("data")));
        assert!(has_value(&json!(1)));
        assert!(!has_value(&json!("")));
        assert!(!has_value(&json!(null)));
    }
}
