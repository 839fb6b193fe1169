//! Resolution cache.
//!
//! # Responsibilities
//! - Memoize successful resolutions by resource name
//! - Bound memory: once `max_entries` is exceeded, keep only the newest
//!   `keep_count` entries by load time
//!
//! # Design Decisions
//! - Insert and eviction happen under one lock, so the bound holds even
//!   with concurrent inserts
//! - Policy is "keep newest N by load time"; reads bump `hit_count` but do
//!   not refresh an entry's position
//! - Entries remember the registry generation they were resolved against

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::clock::unix_millis;
use crate::config::CacheConfig;
use crate::observability::metrics;
use crate::registry::ResourceDescriptor;

/// A memoized resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub resource_name: String,
    pub descriptor: ResourceDescriptor,
    /// Load time, milliseconds since the Unix epoch.
    pub loaded_at_ms: u64,
    pub hit_count: u64,
    pub generation: u64,
    /// Insertion order; breaks ties between equal load times.
    #[serde(skip)]
    sequence: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    next_sequence: u64,
}

/// Bounded name → descriptor cache.
pub struct ResolutionCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
    keep_count: usize,
}

impl ResolutionCache {
    pub fn new(config: &CacheConfig) -> Self {
        let max_entries = config.max_entries.max(1);
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries,
            keep_count: config.keep_count.min(max_entries),
        }
    }

    /// Look up an entry, counting the hit.
    pub fn get(&self, name: &str) -> Option<CacheEntry> {
        let mut inner = self.inner.lock().expect("resolution cache mutex poisoned");
        inner.entries.get_mut(name).map(|entry| {
            entry.hit_count += 1;
            entry.clone()
        })
    }

    /// Insert (or replace) an entry, evicting if the bound is exceeded.
    ///
    /// Returns the number of entries evicted.
    pub fn put(&self, name: &str, descriptor: ResourceDescriptor, generation: u64) -> usize {
        let mut inner = self.inner.lock().expect("resolution cache mutex poisoned");
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        inner.entries.insert(
            name.to_string(),
            CacheEntry {
                resource_name: name.to_string(),
                descriptor,
                loaded_at_ms: unix_millis(),
                hit_count: 0,
                generation,
                sequence,
            },
        );

        let evicted = Self::evict_locked(&mut inner, self.max_entries, self.keep_count);
        metrics::record_cache_size(inner.entries.len());
        evicted
    }

    /// Run eviction if the cache is over its bound.
    pub fn evict_if_needed(&self) -> usize {
        let mut inner = self.inner.lock().expect("resolution cache mutex poisoned");
        Self::evict_locked(&mut inner, self.max_entries, self.keep_count)
    }

    fn evict_locked(inner: &mut CacheInner, max_entries: usize, keep_count: usize) -> usize {
        if inner.entries.len() <= max_entries {
            return 0;
        }

        let mut order: Vec<(u64, u64, String)> = inner
            .entries
            .values()
            .map(|e| (e.loaded_at_ms, e.sequence, e.resource_name.clone()))
            .collect();
        // Newest first.
        order.sort_unstable_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));

        let evicted = order.len().saturating_sub(keep_count);
        for (_, _, name) in order.into_iter().skip(keep_count) {
            inner.entries.remove(&name);
        }

        tracing::debug!(evicted, retained = inner.entries.len(), "Resolution cache evicted");
        metrics::record_cache_event("evict", evicted as u64);
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("resolution cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("resolution cache mutex poisoned");
        inner.entries.clear();
        metrics::record_cache_size(0);
    }

    /// All entries, newest first.
    pub fn snapshot(&self) -> Vec<CacheEntry> {
        let inner = self.inner.lock().expect("resolution cache mutex poisoned");
        let mut entries: Vec<CacheEntry> = inner.entries.values().cloned().collect();
        entries.sort_unstable_by(|a, b| (b.loaded_at_ms, b.sequence).cmp(&(a.loaded_at_ms, a.sequence)));
        entries
    }
}
