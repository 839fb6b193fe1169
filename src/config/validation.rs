//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every CIDR range parses
//! - Detect duplicate model classes across categories
//! - Validate value ranges (cache bounds, key and digest encodings)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::geo::Cidr;
use crate::security::capability::{parse_digest, parse_public_key};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid range '{value}'")]
    InvalidRange { field: String, value: String },
    #[error("model '{name}' registered in both '{first}' and '{second}'")]
    DuplicateModel {
        name: String,
        first: String,
        second: String,
    },
    #[error("category '{category}': model entry with empty class or file")]
    IncompleteModel { category: String },
    #[error("cache.max_entries must be positive")]
    ZeroCacheCapacity,
    #[error("cache.keep_count ({keep}) exceeds cache.max_entries ({max})")]
    KeepExceedsCapacity { keep: usize, max: usize },
    #[error("sensitivity.{field}: {message}")]
    InvalidCredential { field: &'static str, message: String },
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },
    #[error("admin.api_key must be set to a non-placeholder secret when admin.enabled")]
    InsecureAdminKey,
}

/// Key shipped in old sample configs. Never accepted.
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_ranges(config, &mut errors);
    check_registry(config, &mut errors);

    if config.cache.max_entries == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }
    if config.cache.keep_count > config.cache.max_entries {
        errors.push(ValidationError::KeepExceedsCapacity {
            keep: config.cache.keep_count,
            max: config.cache.max_entries,
        });
    }

    for digest in &config.sensitivity.capability_token_digests {
        if let Err(e) = parse_digest(digest) {
            errors.push(ValidationError::InvalidCredential {
                field: "capability_token_digests",
                message: e.to_string(),
            });
        }
    }
    for key in &config.sensitivity.trusted_token_keys {
        if let Err(e) = parse_public_key(key) {
            errors.push(ValidationError::InvalidCredential {
                field: "trusted_token_keys",
                message: e.to_string(),
            });
        }
    }

    // The admin key also opens admin-only resources on the public listener.
    if config.admin.enabled {
        let key = config.admin.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_ADMIN_KEY {
            errors.push(ValidationError::InsecureAdminKey);
        }
    }

    let addresses = [
        ("listener.bind_address", &config.listener.bind_address),
        ("admin.bind_address", &config.admin.bind_address),
        ("observability.metrics_address", &config.observability.metrics_address),
    ];
    for (field, value) in addresses {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_range_list(field: &str, ranges: &[String], errors: &mut Vec<ValidationError>) {
    for value in ranges {
        if Cidr::parse(value).is_err() {
            errors.push(ValidationError::InvalidRange {
                field: field.to_string(),
                value: value.clone(),
            });
        }
    }
}

fn check_ranges(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    check_range_list("geo.development_ips.ranges", &config.geo.development_ips.ranges, errors);
    check_range_list("geo.blocked_ips", &config.geo.blocked_ips, errors);
    for (region, region_cfg) in &config.geo.allowed_countries {
        for (code, country) in &region_cfg.countries {
            let field = format!("geo.allowed_countries.{}.countries.{}.ip_ranges", region, code);
            check_range_list(&field, &country.ip_ranges, errors);
        }
    }
}

fn check_registry(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for (category, entry) in &config.registry.model_registry {
        for model in &entry.models {
            if model.class.trim().is_empty() || model.file.trim().is_empty() {
                errors.push(ValidationError::IncompleteModel {
                    category: category.clone(),
                });
                continue;
            }
            if let Some(first) = seen.insert(model.class.as_str(), category.as_str()) {
                errors.push(ValidationError::DuplicateModel {
                    name: model.class.clone(),
                    first: first.to_string(),
                    second: category.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryConfig, ModelEntry};

    fn model(class: &str) -> ModelEntry {
        ModelEntry {
            class: class.into(),
            file: format!("{}.model", class.to_lowercase()),
            description: None,
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.geo.blocked_ips = vec!["999.1.1.1".into()];
        config.geo.development_ips.ranges = vec!["10.0.0.0/40".into()];
        config.cache.keep_count = 100;
        config.sensitivity.capability_token_digests = vec!["nothex".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::KeepExceedsCapacity { keep: 100, max: 50 }));
    }

    #[test]
    fn test_duplicate_model_detected() {
        let mut config = GatewayConfig::default();
        config.registry.model_registry.insert(
            "residents".into(),
            CategoryConfig {
                path: "models/residents".into(),
                namespace: String::new(),
                models: vec![model("Persona"), model("Dispositivo")],
            },
        );
        config.registry.model_registry.insert(
            "staff".into(),
            CategoryConfig {
                path: "models/staff".into(),
                namespace: String::new(),
                models: vec![model("Persona")],
            },
        );

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateModel {
                name: "Persona".into(),
                first: "residents".into(),
                second: "staff".into(),
            }]
        );
    }

    #[test]
    fn test_incomplete_model() {
        let mut config = GatewayConfig::default();
        config.registry.model_registry.insert(
            "vendors".into(),
            CategoryConfig {
                path: "models/vendors".into(),
                namespace: String::new(),
                models: vec![ModelEntry {
                    class: "Proveedor".into(),
                    file: " ".into(),
                    description: None,
                }],
            },
        );
        assert!(matches!(
            validate_config(&config).unwrap_err()[0],
            ValidationError::IncompleteModel { .. }
        ));
    }

    #[test]
    fn test_bad_address() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "localhost".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidAddress { field: "listener.bind_address", .. }));
    }

    #[test]
    fn test_admin_key_required_when_enabled() {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::InsecureAdminKey]);

        config.admin.api_key = PLACEHOLDER_ADMIN_KEY.into();
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::InsecureAdminKey]);

        config.admin.api_key = "   ".into();
        assert!(validate_config(&config).is_err());

        config.admin.api_key = "k9v2-condo-ops".into();
        assert!(validate_config(&config).is_ok());

        // A disabled admin API does not need a key.
        config.admin.enabled = false;
        config.admin.api_key = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
