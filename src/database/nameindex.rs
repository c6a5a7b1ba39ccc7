//! The phonetic name index.
//!
//! Maps the 5-character name key of §name handling to the set of record keys
//! of persons bearing a matching name. Many persons share one entry; set
//! membership deduplicates.

use std::collections::{BTreeSet, HashMap};

use crate::name::name_to_name_key;

/// Maps name keys to sets of person record keys.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: HashMap<String, BTreeSet<String>>,
}

impl NameIndex {
    /// Creates an empty name index.
    #[must_use]
    pub fn new() -> Self {
        NameIndex::default()
    }

    /// Inserts a person under a name key computed from `name`.
    pub fn insert(&mut self, name: &str, record_key: &str) {
        self.entries
            .entry(name_to_name_key(name))
            .or_default()
            .insert(record_key.to_string());
    }

    /// Removes a person from the entry for `name`. Empty entries are
    /// dropped.
    pub fn remove(&mut self, name: &str, record_key: &str) {
        let name_key = name_to_name_key(name);
        if let Some(set) = self.entries.get_mut(&name_key) {
            set.remove(record_key);
            if set.is_empty() {
                self.entries.remove(&name_key);
            }
        }
    }

    /// Returns the set of record keys whose name key equals the query
    /// name's. Callers filter further by piece matching.
    #[must_use]
    pub fn search(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&name_to_name_key(name))
    }

    /// Returns the number of distinct name keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `(number of name keys, number of indexed record keys)`.
    #[must_use]
    pub fn stats(&self) -> (usize, usize) {
        let records = self.entries.values().map(BTreeSet::len).sum();
        (self.entries.len(), records)
    }
}
