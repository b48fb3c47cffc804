use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plain persistent key-value namespace.
///
/// No time-based eviction: entry lifetime is tied to explicit deletion by
/// the cleanup protocol. Keys iterate in deterministic order so snapshots
/// and sweeps are reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueStore<V> {
    name: String,
    entries: BTreeMap<String, V>,
}

impl<V> KeyValueStore<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Logical namespace name, e.g. `pagination-summary-store`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn put(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn delete(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
