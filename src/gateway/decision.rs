//! Per-request outcome values.

use std::fmt;

use serde::Serialize;

use crate::geo::Classification;
use crate::registry::ResourceDescriptor;

/// Which pipeline stage produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTier {
    GeoDenied,
    RateDenied,
    RestrictedDenied,
    NotFound,
    Granted,
    CacheHit,
}

impl DecisionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionTier::GeoDenied => "geo_denied",
            DecisionTier::RateDenied => "rate_denied",
            DecisionTier::RestrictedDenied => "restricted_denied",
            DecisionTier::NotFound => "not_found",
            DecisionTier::Granted => "granted",
            DecisionTier::CacheHit => "cache_hit",
        }
    }

    fn default_reason(&self) -> &'static str {
        match self {
            DecisionTier::GeoDenied => "Access denied for client origin",
            DecisionTier::RateDenied => "Request budget exceeded",
            DecisionTier::RestrictedDenied => "Access to restricted resource denied",
            DecisionTier::NotFound => "Resource not found",
            DecisionTier::Granted => "Access granted",
            DecisionTier::CacheHit => "Served from resolution cache",
        }
    }
}

impl fmt::Display for DecisionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert level attached to restricted-tier denials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Standard,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Standard => f.write_str("standard"),
            AlertSeverity::Critical => f.write_str("critical"),
        }
    }
}

/// The requesting client as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientIdentity {
    pub ip: String,
    pub classification: Classification,
    /// Heuristic reputation, always within [0, 10].
    pub score: f64,
}

/// Result of running a request through the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityDecision {
    pub allowed: bool,
    pub reason: String,
    pub tier: DecisionTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_severity: Option<AlertSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<ResourceDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientIdentity>,
}

impl SecurityDecision {
    pub fn grant(tier: DecisionTier, reason: impl Into<String>) -> Self {
        Self::new(true, tier, reason.into())
    }

    /// A denial. An empty reason is replaced by the tier's default so a
    /// denial always explains itself.
    pub fn deny(tier: DecisionTier, reason: impl Into<String>) -> Self {
        Self::new(false, tier, reason.into())
    }

    fn new(allowed: bool, tier: DecisionTier, reason: String) -> Self {
        let reason = if reason.trim().is_empty() {
            tier.default_reason().to_string()
        } else {
            reason
        };
        Self {
            allowed,
            reason,
            tier,
            alert_severity: None,
            descriptor: None,
            client: None,
        }
    }

    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.alert_severity = Some(severity);
        self
    }

    pub fn with_descriptor(mut self, descriptor: ResourceDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn with_client(mut self, client: ClientIdentity) -> Self {
        self.client = Some(client);
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.tier == DecisionTier::NotFound
    }

    /// True for denials produced by a security stage (not `NotFound`).
    pub fn is_security_denial(&self) -> bool {
        !self.allowed && !self.is_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_always_has_reason() {
        let d = SecurityDecision::deny(DecisionTier::RateDenied, "   ");
        assert!(!d.allowed);
        assert_eq!(d.reason, "Request budget exceeded");
        assert_eq!(d.tier, DecisionTier::RateDenied);
        assert!(d.is_security_denial());
    }

    #[test]
    fn test_not_found_is_not_security_denial() {
        let d = SecurityDecision::deny(DecisionTier::NotFound, "Resource 'X' not registered");
        assert!(d.is_not_found());
        assert!(!d.is_security_denial());
    }

    #[test]
    fn test_serialized_shape() {
        let d = SecurityDecision::deny(DecisionTier::RestrictedDenied, "spoofed")
            .with_severity(AlertSeverity::Critical);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["tier"], "restricted_denied");
        assert_eq!(json["alert_severity"], "critical");
        assert!(json.get("descriptor").is_none());
    }
}
