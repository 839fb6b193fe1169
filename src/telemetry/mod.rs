//! Per-client telemetry.
//!
//! # Responsibilities
//! - Create a `ClientStats` lazily on first contact
//! - Count outcomes and resource/category usage per client
//! - Derive the security score on demand
//! - Aggregate process-wide totals
//!
//! # Design Decisions
//! - `DashMap` entry guards give per-client read-modify-write without a
//!   global lock
//! - Scores are computed when read, never stored

pub mod score;
pub mod stats;

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::Serialize;

use crate::clock::unix_secs;
use crate::registry::ResourceDescriptor;

pub use score::security_score;
pub use stats::{ClientStats, TelemetryEvent};

/// Stats for one client together with its current score.
#[derive(Debug, Clone, Serialize)]
pub struct ClientReport {
    pub ip: String,
    pub score: f64,
    pub stats: ClientStats,
}

/// Totals across all clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryTotals {
    pub clients: usize,
    pub total_requests: u64,
    pub cache_hits: u64,
    pub successes: u64,
    pub failures: u64,
    pub not_found: u64,
    pub resource_counts: BTreeMap<String, u64>,
    pub category_counts: BTreeMap<String, u64>,
    pub average_score: f64,
}

/// Shared store of per-client counters.
#[derive(Default)]
pub struct TelemetryStore {
    clients: DashMap<String, ClientStats>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome for `client`.
    pub fn record(&self, client: &str, event: TelemetryEvent, descriptor: Option<&ResourceDescriptor>) {
        self.record_at(client, event, descriptor, unix_secs());
    }

    pub(crate) fn record_at(
        &self,
        client: &str,
        event: TelemetryEvent,
        descriptor: Option<&ResourceDescriptor>,
        now: u64,
    ) {
        self.clients
            .entry(client.to_string())
            .or_insert_with(|| ClientStats::new(now))
            .apply(event, descriptor, now);
    }

    /// Current score; clients never seen score as a fresh client.
    pub fn score(&self, client: &str) -> f64 {
        let now = unix_secs();
        match self.clients.get(client) {
            Some(stats) => security_score(&stats, now),
            None => security_score(&ClientStats::new(now), now),
        }
    }

    pub fn client(&self, client: &str) -> Option<ClientReport> {
        let now = unix_secs();
        self.clients.get(client).map(|stats| ClientReport {
            ip: client.to_string(),
            score: security_score(&stats, now),
            stats: stats.clone(),
        })
    }

    pub fn all(&self) -> BTreeMap<String, ClientReport> {
        let now = unix_secs();
        self.clients
            .iter()
            .map(|r| {
                let report = ClientReport {
                    ip: r.key().clone(),
                    score: security_score(r.value(), now),
                    stats: r.value().clone(),
                };
                (r.key().clone(), report)
            })
            .collect()
    }

    pub fn totals(&self) -> TelemetryTotals {
        let now = unix_secs();
        let mut totals = TelemetryTotals::default();
        let mut score_sum = 0.0;

        for r in self.clients.iter() {
            let s = r.value();
            totals.clients += 1;
            totals.total_requests += s.total_requests;
            totals.cache_hits += s.cache_hits;
            totals.successes += s.successes;
            totals.failures += s.failures;
            totals.not_found += s.not_found;
            for (k, v) in &s.resource_counts {
                *totals.resource_counts.entry(k.clone()).or_insert(0) += v;
            }
            for (k, v) in &s.category_counts {
                *totals.category_counts.entry(k.clone()).or_insert(0) += v;
            }
            score_sum += security_score(s, now);
        }

        if totals.clients > 0 {
            totals.average_score = score_sum / totals.clients as f64;
        }
        totals
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn clear(&self) {
        self.clients.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensitivityTier;
    use std::path::PathBuf;

    fn descriptor(name: &str, category: &str) -> ResourceDescriptor {
        ResourceDescriptor {
            name: name.into(),
            category: category.into(),
            file_path: PathBuf::from("x"),
            namespace: String::new(),
            sensitivity_tier: SensitivityTier::Public,
        }
    }

    #[test]
    fn test_lazy_creation_and_counts() {
        let store = TelemetryStore::new();
        assert!(store.client("10.0.0.1").is_none());

        let persona = descriptor("Persona", "residents");
        store.record("10.0.0.1", TelemetryEvent::SuccessfulLoad, Some(&persona));
        store.record("10.0.0.1", TelemetryEvent::CacheHit, Some(&persona));
        store.record("10.0.0.1", TelemetryEvent::Denied, None);
        store.record("10.0.0.1", TelemetryEvent::NotFound, None);

        let report = store.client("10.0.0.1").unwrap();
        let s = report.stats;
        assert_eq!(s.total_requests, 4);
        assert_eq!(s.successes, 2);
        assert_eq!(s.cache_hits, 1);
        assert_eq!(s.failures, 1);
        assert_eq!(s.not_found, 1);
        assert_eq!(s.resource_counts.get("Persona"), Some(&2));
        assert_eq!(s.category_counts.get("residents"), Some(&2));
        assert!((0.0..=10.0).contains(&report.score));
    }

    #[test]
    fn test_unknown_client_score() {
        let store = TelemetryStore::new();
        assert_eq!(store.score("203.0.113.1"), 5.0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_totals_merge_histograms() {
        let store = TelemetryStore::new();
        store.record("a", TelemetryEvent::SuccessfulLoad, Some(&descriptor("Persona", "residents")));
        store.record("b", TelemetryEvent::SuccessfulLoad, Some(&descriptor("Persona", "residents")));
        store.record("b", TelemetryEvent::SuccessfulLoad, Some(&descriptor("Proveedor", "vendors")));

        let totals = store.totals();
        assert_eq!(totals.clients, 2);
        assert_eq!(totals.total_requests, 3);
        assert_eq!(totals.resource_counts.get("Persona"), Some(&2));
        assert_eq!(totals.category_counts.get("vendors"), Some(&1));
        assert!(totals.average_score > 0.0);

        store.clear();
        assert_eq!(store.totals(), TelemetryTotals::default());
    }

    #[test]
    fn test_last_seen_advances() {
        let store = TelemetryStore::new();
        store.record_at("a", TelemetryEvent::NotFound, None, 100);
        store.record_at("a", TelemetryEvent::NotFound, None, 250);
        let s = store.client("a").unwrap().stats;
        assert_eq!(s.first_seen, 100);
        assert_eq!(s.last_seen, 250);
    }
}
