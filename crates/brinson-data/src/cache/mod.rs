//! Caching layer for loaded datasets.
//!
//! Datasets are keyed by the content fingerprint of their source, so an edit
//! to any sheet produces a new key and the stale entry is never served. Each
//! source (by its `describe()` text) remembers the fingerprint it last
//! resolved to; when that changes, the superseded dataset is evicted unless
//! another source still resolves to it. Cached datasets are immutable and
//! shared as `Arc`s.

pub mod fingerprint;

pub use fingerprint::{Fingerprint, FingerprintHasher};

use crate::error::Result;
use crate::loader::{Dataset, DatasetLoader};
use crate::workbook::SheetSource;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached datasets.
    pub entries: usize,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that triggered a load.
    pub misses: u64,
}

#[derive(Debug, Default)]
struct Entries {
    datasets: HashMap<Fingerprint, Arc<Dataset>>,
    latest: HashMap<String, Fingerprint>,
}

impl Entries {
    /// Point `origin` at `fingerprint`, evicting what it pointed at before.
    fn track(&mut self, origin: String, fingerprint: Fingerprint) {
        let Some(stale) = self.latest.insert(origin, fingerprint.clone()) else {
            return;
        };
        if stale == fingerprint || self.latest.values().any(|f| *f == stale) {
            return;
        }
        if self.datasets.remove(&stale).is_some() {
            debug!(fingerprint = stale.short(), "evicted superseded dataset");
        }
    }
}

/// Fingerprint-keyed cache of loaded datasets.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: RwLock<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DatasetCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a dataset by fingerprint.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Dataset>> {
        self.entries.read().datasets.get(fingerprint).cloned()
    }

    fn lookup(&self, origin: &str, fingerprint: &Fingerprint) -> Option<Arc<Dataset>> {
        {
            let entries = self.entries.read();
            let hit = entries.datasets.get(fingerprint)?;
            if entries.latest.get(origin) == Some(fingerprint) {
                return Some(Arc::clone(hit));
            }
        }
        let mut entries = self.entries.write();
        let hit = entries.datasets.get(fingerprint).cloned()?;
        entries.track(origin.to_string(), fingerprint.clone());
        Some(hit)
    }

    /// Return the cached dataset for the source's current content, loading it
    /// on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be fingerprinted or loaded.
    /// Failed loads are not cached.
    pub fn get_or_load(
        &self,
        source: &dyn SheetSource,
        loader: &DatasetLoader,
    ) -> Result<Arc<Dataset>> {
        let fingerprint = source.fingerprint()?;
        let origin = source.describe();
        if let Some(hit) = self.lookup(&origin, &fingerprint) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint = fingerprint.short(), "dataset cache hit");
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        info!(
            source = %origin,
            fingerprint = fingerprint.short(),
            "loading dataset"
        );
        let dataset = Arc::new(loader.load_with_fingerprint(source, fingerprint.clone())?);

        // A concurrent load of the same content may have won the race; keep
        // the first entry so every caller shares one Arc.
        let mut entries = self.entries.write();
        let dataset = Arc::clone(
            entries
                .datasets
                .entry(fingerprint.clone())
                .or_insert(dataset),
        );
        entries.track(origin, fingerprint);
        Ok(dataset)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        let removed = self.entries.write().datasets.remove(fingerprint).is_some();
        if removed {
            debug!(fingerprint = fingerprint.short(), "invalidated dataset");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.datasets.clear();
        entries.latest.clear();
    }

    /// Number of cached datasets.
    pub fn len(&self) -> usize {
        self.entries.read().datasets.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().datasets.is_empty()
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
