//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the resolution gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration for the public resource endpoint.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API configuration.
    pub admin: AdminConfig,

    /// Request budget (rate limiting) configuration.
    pub rate_limit: RateLimitConfig,

    /// Resolution cache bounds.
    pub cache: CacheConfig,

    /// Behaviour when a collaborator fails to initialize.
    pub dependencies: DependencyConfig,

    /// Client IP extraction settings.
    pub client_ip: ClientIpConfig,

    /// Network origin classification.
    pub geo: GeoConfig,

    /// Resource registry.
    pub registry: RegistryConfig,

    /// Sensitivity tiers and admin-tier checks.
    pub sensitivity: SensitivityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token). Requests to the resource
    /// endpoint that present it are treated as authenticated admin sessions.
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // Must be set before enabling; validation rejects an empty key.
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Sustained requests per second per client.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 20,
            burst_size: 40,
        }
    }
}

/// Resolution cache bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry count above which eviction runs.
    pub max_entries: usize,

    /// Entries retained (newest by load time) after eviction.
    pub keep_count: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            keep_count: 30,
        }
    }
}

/// What to do with a pipeline stage whose collaborator failed to build.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Skip the stage, logging a warning on every request.
    FailOpen,
    /// Deny every request at that stage.
    #[default]
    FailClosed,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DependencyConfig {
    pub on_failure: FailurePolicy,
}

/// Client IP extraction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Honour proxy headers. When false only the socket address is used.
    pub trust_proxy_headers: bool,

    /// Headers scanned in order before falling back to the socket address.
    pub headers: Vec<String>,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            trust_proxy_headers: true,
            headers: [
                "cf-connecting-ip",
                "true-client-ip",
                "x-forwarded-for",
                "x-real-ip",
                "x-forwarded",
                "forwarded-for",
                "forwarded",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Network origin classification tables.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GeoConfig {
    /// Ranges always treated as development traffic.
    pub development_ips: DevelopmentIps,

    /// Explicitly blocked addresses or ranges.
    pub blocked_ips: Vec<String>,

    /// Allow-list: region -> countries -> ranges.
    pub allowed_countries: BTreeMap<String, RegionConfig>,

    pub access_rules: AccessRules,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DevelopmentIps {
    pub ranges: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegionConfig {
    pub countries: BTreeMap<String, CountryConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CountryConfig {
    pub name: String,

    /// Lower values are checked first within a region.
    #[serde(default)]
    pub priority: u32,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub ip_ranges: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AccessRules {
    /// Log every granted resolution at info level instead of debug.
    pub log_all_access: bool,
}

/// Resource registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Namespace prefix -> base path, used when no exact entry matches.
    pub namespaces: BTreeMap<String, String>,

    /// Category -> model list.
    pub model_registry: BTreeMap<String, CategoryConfig>,

    /// Extension appended to paths derived from namespace prefixes.
    pub file_extension: String,

    /// Separator between namespace segments in resource names.
    pub namespace_separator: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespaces: BTreeMap::new(),
            model_registry: BTreeMap::new(),
            file_extension: "model".to_string(),
            namespace_separator: "::".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryConfig {
    pub path: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelEntry {
    pub class: String,
    pub file: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Sensitivity classification of a resource, ordered least to most restricted.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityTier {
    #[default]
    Public,
    Sensitive,
    AdminOnly,
}

impl std::fmt::Display for SensitivityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SensitivityTier::Public => "public",
            SensitivityTier::Sensitive => "sensitive",
            SensitivityTier::AdminOnly => "admin_only",
        };
        f.write_str(s)
    }
}

/// Sensitivity tiers and admin-tier heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Resource name -> tier.
    pub tiers: BTreeMap<String, SensitivityTier>,

    /// Tier of resources not listed in `tiers`.
    pub default_tier: SensitivityTier,

    /// Tool-name substrings that mark a declared identity as spoofed.
    pub spoof_signatures: Vec<String>,

    /// Keywords that mark a declared identity as claiming admin rights.
    pub admin_keywords: Vec<String>,

    /// Hex SHA-256 digests of accepted opaque capability tokens.
    pub capability_token_digests: Vec<String>,

    /// Hex Ed25519 public keys trusted to sign capability tokens.
    pub trusted_token_keys: Vec<String>,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            tiers: BTreeMap::new(),
            default_tier: SensitivityTier::Public,
            spoof_signatures: [
                "admintool",
                "sqlmap",
                "nikto",
                "nmap",
                "burp",
                "postman",
                "insomnia",
                "httpie",
                "curl",
                "wget",
                "python-requests",
                "go-http-client",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            admin_keywords: ["admin", "administrator", "root", "superuser"]
                .into_iter()
                .map(String::from)
                .collect(),
            capability_token_digests: Vec::new(),
            trusted_token_keys: Vec::new(),
        }
    }
}
