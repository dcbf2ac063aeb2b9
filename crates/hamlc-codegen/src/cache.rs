//! Compiled output cache.

use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::Arc;

use parking_lot::RwLock;
use rapidhash::fast::RapidHasher;

use crate::target::TargetKind;
use crate::CompilerOutput;

/// Compiled outputs keyed by a hash of namespace, target and source.
///
/// The namespace separates outputs produced with different evaluators;
/// namespace 0 belongs to the default evaluator. Safe to share between
/// threads. Concurrent inserts for the same key store the same output, so the
/// last writer wins.
#[derive(Debug, Default)]
pub struct OutputCache {
    entries: RwLock<HashMap<u64, Arc<CompilerOutput>>>,
}

impl OutputCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for `source` compiled for `target` in `namespace`.
    pub fn key(namespace: u64, target: TargetKind, source: &str) -> u64 {
        let mut hasher = RapidHasher::default();
        hasher.write_u64(namespace);
        hasher.write(target.name().as_bytes());
        hasher.write_u8(0);
        hasher.write(source.as_bytes());
        hasher.finish()
    }

    pub fn get(&self, key: u64) -> Option<Arc<CompilerOutput>> {
        self.entries.read().get(&key).cloned()
    }

    pub fn insert(&self, key: u64, output: Arc<CompilerOutput>) {
        self.entries.write().insert(key, output);
    }

    /// Number of cached outputs.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
