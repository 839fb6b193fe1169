//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FailurePolicy, SensitivityTier};
    use std::io::Write;

    const SAMPLE: &str = r#"
[cache]
max_entries = 10
keep_count = 4

[dependencies]
on_failure = "fail_open"

[geo.development_ips]
ranges = ["10.0.0.0/8"]

[geo.allowed_countries.latam.countries.MX]
name = "Mexico"
priority = 1
language = "es"
ip_ranges = ["187.0.0.0/8"]

[registry.namespaces]
"condo" = "models"

[registry.model_registry.residents]
path = "models/residents"
namespace = "condo::residents"
models = [{ class = "Persona", file = "persona.model", description = "Residents" }]

[sensitivity.tiers]
Persona = "sensitive"
NominaModel = "admin_only"
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.cache.max_entries, 10);
        assert_eq!(config.dependencies.on_failure, FailurePolicy::FailOpen);
        assert_eq!(config.geo.allowed_countries["latam"].countries["MX"].priority, 1);
        assert_eq!(config.sensitivity.tiers["NominaModel"], SensitivityTier::AdminOnly);
        // Untouched sections keep defaults.
        assert!(config.rate_limit.enabled);
        assert!(!config.sensitivity.spoof_signatures.is_empty());
    }

    #[test]
    fn test_empty_document_is_valid() {
        let config = parse_config("").unwrap();
        assert_eq!(config.cache.max_entries, 50);
        assert_eq!(config.cache.keep_count, 30);
        assert_eq!(config.dependencies.on_failure, FailurePolicy::FailClosed);
    }

    #[test]
    fn test_unknown_tier_is_parse_error() {
        let err = parse_config("[sensitivity.tiers]\nX = \"secret\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let config = parse_config(include_str!("../../gateway.toml")).unwrap();
        assert_eq!(config.registry.model_registry.len(), 3);
        assert_eq!(config.sensitivity.tiers["EmpleadosUser"], SensitivityTier::AdminOnly);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.registry.model_registry.len(), 1);

        let missing = load_config(Path::new("/nonexistent/gateway.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
