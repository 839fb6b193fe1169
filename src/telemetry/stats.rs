//! Per-client counters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::ResourceDescriptor;

/// Something that happened to a client's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryEvent {
    CacheHit,
    SuccessfulLoad,
    NotFound,
    Denied,
}

/// Counters for one client address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub successes: u64,
    pub failures: u64,
    pub not_found: u64,
    pub resource_counts: BTreeMap<String, u64>,
    pub category_counts: BTreeMap<String, u64>,
    /// Unix seconds.
    pub first_seen: u64,
    /// Unix seconds.
    pub last_seen: u64,
}

impl ClientStats {
    pub fn new(now: u64) -> Self {
        Self {
            total_requests: 0,
            cache_hits: 0,
            successes: 0,
            failures: 0,
            not_found: 0,
            resource_counts: BTreeMap::new(),
            category_counts: BTreeMap::new(),
            first_seen: now,
            last_seen: now,
        }
    }

    pub(crate) fn apply(&mut self, event: TelemetryEvent, descriptor: Option<&ResourceDescriptor>, now: u64) {
        self.total_requests += 1;
        self.last_seen = self.last_seen.max(now);

        match event {
            TelemetryEvent::CacheHit => {
                self.cache_hits += 1;
                self.successes += 1;
            }
            TelemetryEvent::SuccessfulLoad => self.successes += 1,
            TelemetryEvent::NotFound => self.not_found += 1,
            TelemetryEvent::Denied => self.failures += 1,
        }

        if let Some(d) = descriptor {
            *self.resource_counts.entry(d.name.clone()).or_insert(0) += 1;
            *self.category_counts.entry(d.category.clone()).or_insert(0) += 1;
        }
    }
}
