//! Transpile cache shared across graph generations.

use std::collections::{BTreeMap, BTreeSet};

use crate::compiler::{TranspileSpec, TranspiledModule};
use uigen_util::hash;

/// Cache of transpiled modules keyed by spec, path, and content.
///
/// Every lookup or insert marks the key live; [`prune`](Self::prune)
/// drops everything not touched since the previous prune.
#[derive(Debug, Default)]
pub struct TranspileCache {
    entries: BTreeMap<String, TranspiledModule>,
    live: BTreeSet<String>,
}

impl TranspileCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the cache key for one file.
    #[must_use]
    pub fn key(spec: &TranspileSpec, path: &str, content: &str) -> String {
        hash::blake3_parts(&[
            &spec.canonical_encoding(),
            path.as_bytes(),
            content.as_bytes(),
        ])
    }

    /// Look up an entry, marking it live.
    pub fn get(&mut self, key: &str) -> Option<&TranspiledModule> {
        let module = self.entries.get(key)?;
        self.live.insert(key.to_string());
        Some(module)
    }

    /// Store an entry, marking it live.
    pub fn insert(&mut self, key: String, module: TranspiledModule) {
        self.live.insert(key.clone());
        self.entries.insert(key, module);
    }

    /// Drop entries not used since the last prune. Returns how many were
    /// removed.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        let live = std::mem::take(&mut self.live);
        self.entries.retain(|key, _| live.contains(key));
        before - self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Paths of every cached module, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.entries.values().map(|m| m.path.as_str()).collect();
        paths.sort_unstable();
        paths
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.live.clear();
    }
}
