//! Protocol-to-context resolution map
//!
//! The target schema requires every new entry to reference a structural
//! context identifier derived from the record's protocol. The map is built
//! once per incoming batch from the protocol identifiers collected off the
//! insert candidates.

use std::collections::HashMap;

/// Mapping from protocol identifier to target context identifier.
#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    entries: HashMap<String, i64>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from (protocol id, context id) pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    /// Resolve a protocol identifier to its context identifier.
    pub fn resolve(&self, protocol_id: &str) -> Option<i64> {
        self.entries.get(protocol_id).copied()
    }

    pub fn insert(&mut self, protocol_id: impl Into<String>, context_id: i64) {
        self.entries.insert(protocol_id.into(), context_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let map = ContextMap::from_pairs([("P-1".to_string(), 10), ("P-2".to_string(), 20)]);
        assert_eq!(map.resolve("P-1"), Some(10));
        assert_eq!(map.resolve("P-2"), Some(20));
        assert_eq!(map.resolve("P-3"), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_empty_map() {
        let map = ContextMap::new();
        assert!(map.is_empty());
        assert_eq!(map.resolve("anything"), None);
    }
}
