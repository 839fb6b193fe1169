//! Sensitivity tiers and admin-only authorization.
//!
//! # Responsibilities
//! - Map resource names to a sensitivity tier
//! - Apply the admin-only checks in fixed order: spoof signature,
//!   claimed-admin keyword, then session / capability token
//!
//! # Design Decisions
//! - The spoof check always runs first and short-circuits; a token supplied
//!   alongside a spoofed identity is never inspected
//! - Identity matching is case-insensitive substring matching
//! - The identity string is client supplied; matches are also logged as
//!   security alerts

use std::collections::HashMap;

use crate::clock::unix_secs;
use crate::config::{SensitivityConfig, SensitivityTier};
use crate::gateway::{AlertSeverity, DecisionTier, RequestMetadata, SecurityDecision};
use crate::security::capability::{CapabilityVerifier, TokenError, TokenGrant};

/// Classifies resources and authorizes access to restricted ones.
#[derive(Debug, Clone)]
pub struct SensitivityGate {
    tiers: HashMap<String, SensitivityTier>,
    default_tier: SensitivityTier,
    spoof_signatures: Vec<String>,
    admin_keywords: Vec<String>,
    verifier: CapabilityVerifier,
}

fn lowercase_non_empty(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl SensitivityGate {
    pub fn from_config(config: &SensitivityConfig) -> Result<Self, TokenError> {
        Ok(Self {
            tiers: config.tiers.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            default_tier: config.default_tier,
            spoof_signatures: lowercase_non_empty(&config.spoof_signatures),
            admin_keywords: lowercase_non_empty(&config.admin_keywords),
            verifier: CapabilityVerifier::from_config(config)?,
        })
    }

    pub fn tier_of(&self, resource: &str) -> SensitivityTier {
        self.tiers.get(resource).copied().unwrap_or(self.default_tier)
    }

    /// Authorize access to `resource` using its configured tier.
    pub fn authorize(&self, resource: &str, metadata: &RequestMetadata) -> SecurityDecision {
        self.authorize_tier(resource, self.tier_of(resource), metadata, unix_secs())
    }

    pub(crate) fn authorize_tier(
        &self,
        resource: &str,
        tier: SensitivityTier,
        metadata: &RequestMetadata,
        now: u64,
    ) -> SecurityDecision {
        match tier {
            SensitivityTier::Public => {
                SecurityDecision::grant(DecisionTier::Granted, "Public resource")
            }
            SensitivityTier::Sensitive => {
                tracing::info!(
                    resource = %resource,
                    request_id = ?metadata.request_id,
                    "Sensitive resource access"
                );
                SecurityDecision::grant(DecisionTier::Granted, "Sensitive resource")
            }
            SensitivityTier::AdminOnly => self.authorize_admin(resource, metadata, now),
        }
    }

    fn authorize_admin(&self, resource: &str, metadata: &RequestMetadata, now: u64) -> SecurityDecision {
        let identity = metadata
            .declared_identity
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        if let Some(signature) = self.spoof_signatures.iter().find(|s| identity.contains(s.as_str())) {
            tracing::warn!(
                resource = %resource,
                signature = %signature,
                severity = "critical",
                request_id = ?metadata.request_id,
                "Spoofed client identity on admin-only resource"
            );
            return critical(format!(
                "Client identity matches blocked tool signature '{}'",
                signature
            ));
        }

        if let Some(keyword) = self.admin_keywords.iter().find(|k| identity.contains(k.as_str())) {
            let Some(token) = metadata.capability_token.as_deref() else {
                tracing::warn!(
                    resource = %resource,
                    keyword = %keyword,
                    severity = "critical",
                    "Claimed admin identity without capability token"
                );
                return critical("Claimed admin identity without capability token".to_string());
            };

            return match self.verifier.verify(token, resource, now) {
                Ok(grant) => granted_by_token(resource, grant),
                Err(e) => {
                    tracing::warn!(
                        resource = %resource,
                        keyword = %keyword,
                        error = %e,
                        severity = "critical",
                        "Claimed admin identity with invalid capability token"
                    );
                    critical(format!("Claimed admin identity with invalid capability token: {}", e))
                }
            };
        }

        if metadata.admin_session {
            return SecurityDecision::grant(DecisionTier::Granted, "Authenticated admin session");
        }

        if let Some(token) = metadata.capability_token.as_deref() {
            match self.verifier.verify(token, resource, now) {
                Ok(grant) => return granted_by_token(resource, grant),
                Err(e) => {
                    tracing::debug!(resource = %resource, error = %e, "Capability token rejected");
                }
            }
        }

        SecurityDecision::deny(
            DecisionTier::RestrictedDenied,
            format!("Resource '{}' requires authenticated admin privileges", resource),
        )
        .with_severity(AlertSeverity::Standard)
    }
}

fn critical(reason: String) -> SecurityDecision {
    SecurityDecision::deny(DecisionTier::RestrictedDenied, reason).with_severity(AlertSeverity::Critical)
}

fn granted_by_token(resource: &str, grant: TokenGrant) -> SecurityDecision {
    match grant {
        TokenGrant::Signed { subject } => {
            tracing::info!(resource = %resource, subject = %subject, "Admin access via signed capability token");
            SecurityDecision::grant(DecisionTier::Granted, format!("Capability token for '{}'", subject))
        }
        TokenGrant::Digest => {
            tracing::info!(resource = %resource, "Admin access via opaque capability token");
            SecurityDecision::grant(DecisionTier::Granted, "Capability token")
        }
    }
}
