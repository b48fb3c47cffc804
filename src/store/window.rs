use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One versioned entry inside a window store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct WindowEntry<V> {
    inserted_at_ms: u64,
    value: V,
}

/// Time-bounded persistent map.
///
/// Entries older than `retention_ms` from their insertion timestamp become
/// unreadable and are physically reclaimed on subsequent writes or on
/// `advance`, independent of explicit deletion. This bounds local storage
/// for paginations that never complete. `retain_duplicates` controls
/// whether a re-put within the same `window_ms` bucket creates a second
/// versioned entry or overwrites the existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStore<V> {
    name: String,
    retention_ms: u64,
    window_ms: u64,
    retain_duplicates: bool,
    entries: BTreeMap<String, Vec<WindowEntry<V>>>,
}

impl<V> WindowStore<V> {
    pub fn new(
        name: impl Into<String>,
        retention_ms: u64,
        window_ms: u64,
        retain_duplicates: bool,
    ) -> Self {
        Self {
            name: name.into(),
            retention_ms,
            window_ms,
            retain_duplicates,
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retention_ms(&self) -> u64 {
        self.retention_ms
    }

    /// Writes `value` under `key` at `now_ms`, evicting aged-out versions
    /// of that key in the same pass.
    pub fn put(&mut self, key: impl Into<String>, value: V, now_ms: u64) {
        let key = key.into();
        let versions = self.entries.entry(key).or_default();
        versions.retain(|entry| live(entry.inserted_at_ms, now_ms, self.retention_ms));
        let bucket = now_ms / self.window_ms.max(1);
        if !self.retain_duplicates {
            if let Some(existing) = versions
                .iter_mut()
                .find(|entry| entry.inserted_at_ms / self.window_ms.max(1) == bucket)
            {
                existing.inserted_at_ms = now_ms;
                existing.value = value;
                return;
            }
        }
        versions.push(WindowEntry {
            inserted_at_ms: now_ms,
            value,
        });
    }

    /// Latest live value for `key` as of `now_ms`; aged-out entries are
    /// unreadable even when still physically present.
    pub fn fetch(&self, key: &str, now_ms: u64) -> Option<&V> {
        self.entries.get(key).and_then(|versions| {
            versions
                .iter()
                .filter(|entry| live(entry.inserted_at_ms, now_ms, self.retention_ms))
                .max_by_key(|entry| entry.inserted_at_ms)
                .map(|entry| &entry.value)
        })
    }

    /// Removes every version stored under `key`.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Physically reclaims all aged-out entries as of `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        let retention = self.retention_ms;
        self.entries
            .retain(|_, versions| {
                versions.retain(|entry| live(entry.inserted_at_ms, now_ms, retention));
                !versions.is_empty()
            });
    }

    /// Number of keys with at least one physically present version.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn live(inserted_at_ms: u64, now_ms: u64, retention_ms: u64) -> bool {
    now_ms.saturating_sub(inserted_at_ms) < retention_ms
}
