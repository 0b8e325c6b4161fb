//! Record classification
//!
//! Splits an incoming batch of sanitized records into insert candidates
//! (never migrated) and update candidates (already carrying a target entry
//! identifier). A resumed run naturally skips completed work here: rows
//! migrated by an earlier run arrive with their entry id set and flow down
//! the reconciling update path instead of being inserted twice.

use crate::domain::SourceRecord;

/// An order-preserving partition of one source batch.
#[derive(Debug, Default)]
pub struct ClassifiedBatch {
    /// Records without a target entry identifier, in input order.
    pub to_insert: Vec<SourceRecord>,
    /// Records with an existing target entry identifier, in input order.
    pub to_update: Vec<SourceRecord>,
}

impl ClassifiedBatch {
    pub fn len(&self) -> usize {
        self.to_insert.len() + self.to_update.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty()
    }
}

/// Partition a batch into insert and update candidates.
///
/// Total and exclusive: every record lands in exactly one partition, and
/// input order is preserved within each so downstream failure logs can
/// reference records deterministically.
pub fn classify(records: Vec<SourceRecord>) -> ClassifiedBatch {
    let mut batch = ClassifiedBatch::default();
    for record in records {
        if record.entry_id.is_some() {
            batch.to_update.push(record);
        } else {
            batch.to_insert.push(record);
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str, entry_id: Option<i64>) -> SourceRecord {
        let mut r = SourceRecord::new(label, "1", "P-1");
        r.entry_id = entry_id;
        r
    }

    #[test]
    fn test_classify_empty_batch() {
        let batch = classify(Vec::new());
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_classify_is_total_and_exclusive() {
        let records = vec![
            record("a", None),
            record("b", Some(3)),
            record("c", None),
            record("d", Some(9)),
        ];
        let count = records.len();

        let batch = classify(records);

        assert_eq!(batch.len(), count);
        assert_eq!(batch.to_insert.len(), 2);
        assert_eq!(batch.to_update.len(), 2);
    }

    #[test]
    fn test_classify_preserves_input_order() {
        let records = vec![
            record("i1", None),
            record("u1", Some(1)),
            record("i2", None),
            record("u2", Some(2)),
            record("i3", None),
        ];

        let batch = classify(records);

        let insert_labels: Vec<&str> = batch.to_insert.iter().map(|r| r.label.as_str()).collect();
        let update_labels: Vec<&str> = batch.to_update.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(insert_labels, vec!["i1", "i2", "i3"]);
        assert_eq!(update_labels, vec!["u1", "u2"]);
    }
}
