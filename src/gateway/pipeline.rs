//! The per-request resolution pipeline.

use std::net::IpAddr;
use std::time::Instant;

use crate::clock::unix_secs;
use crate::config::SensitivityTier;
use crate::gateway::stage::{unavailable_passes, Stage};
use crate::gateway::{
    AlertSeverity, ClientIdentity, DecisionTier, Gateway, GatewayState, RequestMetadata,
    SecurityDecision,
};
use crate::geo::Classification;
use crate::observability::metrics;
use crate::registry::ResourceDescriptor;
use crate::security::BudgetDecision;
use crate::telemetry::TelemetryEvent;

impl Gateway {
    /// Run one resolution request through geo, rate, cache, sensitivity and
    /// registry stages.
    ///
    /// Always returns a decision; denials carry the stage that produced them
    /// and a non-empty reason.
    pub fn resolve_resource(
        &self,
        ip: IpAddr,
        name: &str,
        metadata: &RequestMetadata,
    ) -> SecurityDecision {
        let started = Instant::now();
        let state = self.current_state();
        let client_key = ip.to_string();

        let (classification, decision, event) =
            run_stages(&state, ip, &client_key, name, metadata);

        let descriptor = decision.descriptor.clone();
        self.telemetry().record(&client_key, event, descriptor.as_ref());

        let client = ClientIdentity {
            score: self.telemetry().score(&client_key),
            ip: client_key,
            classification,
        };
        let decision = decision.with_client(client);

        observe(&state, name, &decision, metadata, started);
        decision
    }
}

fn run_stages(
    state: &GatewayState,
    ip: IpAddr,
    client_key: &str,
    name: &str,
    metadata: &RequestMetadata,
) -> (Classification, SecurityDecision, TelemetryEvent) {
    let policy = state.config.dependencies.on_failure;

    let classification = match &state.classifier {
        Stage::Ready(classifier) => classifier.classify(ip),
        Stage::Disabled => Classification::Unknown,
        Stage::Unavailable(e) => {
            if !unavailable_passes(policy, e) {
                return denied(
                    Classification::Unknown,
                    SecurityDecision::deny(
                        DecisionTier::GeoDenied,
                        "Client classification unavailable",
                    ),
                );
            }
            Classification::Unknown
        }
    };
    let geo_bypassed = !matches!(state.classifier, Stage::Ready(_));

    if !geo_bypassed && !classification.is_permitted() {
        let reason = match &classification {
            Classification::Blocked => format!("Address {} is blocked", ip),
            _ => format!("Address {} is outside every allowed region", ip),
        };
        return denied(
            classification,
            SecurityDecision::deny(DecisionTier::GeoDenied, reason),
        );
    }

    match &state.budget {
        Stage::Ready(budget) => {
            if let BudgetDecision::Exceeded { reason } = budget.check_limits(client_key) {
                return denied(
                    classification,
                    SecurityDecision::deny(DecisionTier::RateDenied, reason),
                );
            }
        }
        Stage::Disabled => {}
        Stage::Unavailable(e) => {
            if !unavailable_passes(policy, e) {
                return denied(
                    classification,
                    SecurityDecision::deny(DecisionTier::RateDenied, "Request budget unavailable"),
                );
            }
        }
    }

    let now = unix_secs();
    let configured = state.gate.tier_of(name);

    if let Some(entry) = state.cache.get(name) {
        if entry.generation == state.generation {
            metrics::record_cache_event("hit", 1);
            let tier = configured.max(entry.descriptor.sensitivity_tier);
            if tier != SensitivityTier::Public {
                let auth = state.gate.authorize_tier(name, tier, metadata, now);
                if !auth.allowed {
                    return denied(classification, auth);
                }
            }
            let decision = SecurityDecision::grant(DecisionTier::CacheHit, "")
                .with_descriptor(entry.descriptor);
            return (classification, decision, TelemetryEvent::CacheHit);
        }
    }
    metrics::record_cache_event("miss", 1);

    // Gate on the resolved descriptor's tier so namespace aliases of a
    // restricted model are restricted too. Unregistered names still gate
    // on their configured tier before NotFound is reported.
    let resolved = state.registry.resolve(name);
    let tier = match &resolved {
        Ok(descriptor) => configured.max(descriptor.sensitivity_tier),
        Err(_) => configured,
    };

    let mut reason = String::from("Resolved");
    if tier != SensitivityTier::Public {
        let auth = state.gate.authorize_tier(name, tier, metadata, now);
        if !auth.allowed {
            return denied(classification, auth);
        }
        reason = auth.reason;
    }

    match resolved {
        Ok(descriptor) => {
            state.cache.put(name, descriptor.clone(), state.generation);
            let decision = granted(reason, descriptor);
            (classification, decision, TelemetryEvent::SuccessfulLoad)
        }
        Err(e) => {
            let decision = SecurityDecision::deny(DecisionTier::NotFound, e.to_string());
            (classification, decision, TelemetryEvent::NotFound)
        }
    }
}

fn granted(reason: String, descriptor: ResourceDescriptor) -> SecurityDecision {
    SecurityDecision::grant(DecisionTier::Granted, reason).with_descriptor(descriptor)
}

fn denied(
    classification: Classification,
    decision: SecurityDecision,
) -> (Classification, SecurityDecision, TelemetryEvent) {
    (classification, decision, TelemetryEvent::Denied)
}

fn observe(
    state: &GatewayState,
    name: &str,
    decision: &SecurityDecision,
    metadata: &RequestMetadata,
    started: Instant,
) {
    metrics::record_decision(decision.tier.as_str(), started);

    let client = decision.client.as_ref().map(|c| c.ip.as_str()).unwrap_or_default();
    let origin = decision
        .client
        .as_ref()
        .map(|c| c.classification.label())
        .unwrap_or_default();

    if decision.allowed {
        if state.config.geo.access_rules.log_all_access {
            tracing::info!(
                client = %client,
                origin = %origin,
                resource = %name,
                tier = %decision.tier,
                request_id = ?metadata.request_id,
                "Resource access granted"
            );
        } else {
            tracing::debug!(client = %client, resource = %name, tier = %decision.tier, "Resource access granted");
        }
        return;
    }

    if decision.is_not_found() {
        tracing::debug!(client = %client, resource = %name, "Resource not registered");
        return;
    }

    if let Some(severity) = decision.alert_severity {
        metrics::record_security_alert(match severity {
            AlertSeverity::Standard => "standard",
            AlertSeverity::Critical => "critical",
        });
    }
    tracing::warn!(
        client = %client,
        origin = %origin,
        resource = %name,
        tier = %decision.tier,
        reason = %decision.reason,
        request_id = ?metadata.request_id,
        "Resource access denied"
    );
}
