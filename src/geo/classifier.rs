//! Network origin classification.
//!
//! # Responsibilities
//! - Map a client IP to Dev, Blocked, CountryMatch or Unknown
//! - Enforce strict precedence: dev, then blocked, then allow-list
//!
//! # Design Decisions
//! - Tables compiled once from `GeoConfig`; immutable afterwards
//! - Allow-list order is deterministic (region key, then priority, then code)
//! - Unknown origins are denied by the gateway, not here

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::Serialize;

use crate::config::GeoConfig;
use crate::geo::cidr::{parse_all, Cidr};
use crate::gateway::DependencyInitError;

/// Result of classifying a client address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Dev,
    Blocked,
    CountryMatch { code: String, priority: u32 },
    Unknown,
}

impl Classification {
    /// Whether the origin passes the geo stage.
    pub fn is_permitted(&self) -> bool {
        matches!(self, Classification::Dev | Classification::CountryMatch { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Dev => "dev",
            Classification::Blocked => "blocked",
            Classification::CountryMatch { .. } => "country_match",
            Classification::Unknown => "unknown",
        }
    }
}

/// Anything that can classify client addresses.
pub trait ClientClassifier: Send + Sync {
    fn classify(&self, ip: IpAddr) -> Classification;
}

#[derive(Debug, Clone)]
struct CountryRanges {
    code: String,
    priority: u32,
    ranges: Vec<Cidr>,
}

/// CIDR-table classifier built from configuration.
#[derive(Debug, Clone)]
pub struct GeoClassifier {
    dev_ranges: Vec<Cidr>,
    blocked: Vec<Cidr>,
    countries: Vec<CountryRanges>,
}

impl GeoClassifier {
    /// Compile the classifier tables.
    pub fn from_config(config: &GeoConfig) -> Result<Self, DependencyInitError> {
        let init_err = |e: crate::geo::cidr::CidrError| DependencyInitError::Classifier(e.to_string());

        let dev_ranges = parse_all(&config.development_ips.ranges).map_err(init_err)?;
        let blocked = parse_all(&config.blocked_ips).map_err(init_err)?;

        let mut countries = Vec::new();
        for region in config.allowed_countries.values() {
            let mut in_region = Vec::with_capacity(region.countries.len());
            for (code, country) in &region.countries {
                in_region.push(CountryRanges {
                    code: code.clone(),
                    priority: country.priority,
                    ranges: parse_all(&country.ip_ranges).map_err(init_err)?,
                });
            }
            in_region.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.code.cmp(&b.code)));
            countries.extend(in_region);
        }

        tracing::debug!(
            dev_ranges = dev_ranges.len(),
            blocked = blocked.len(),
            countries = countries.len(),
            "Geo classifier compiled"
        );

        Ok(Self {
            dev_ranges,
            blocked,
            countries,
        })
    }

    fn is_dev(&self, ip: IpAddr) -> bool {
        let literal = match ip {
            IpAddr::V4(v4) => v4 == Ipv4Addr::LOCALHOST,
            IpAddr::V6(v6) => {
                v6 == Ipv6Addr::LOCALHOST || v6.to_ipv4_mapped() == Some(Ipv4Addr::LOCALHOST)
            }
        };
        literal || self.dev_ranges.iter().any(|r| r.contains(ip))
    }
}

impl ClientClassifier for GeoClassifier {
    fn classify(&self, ip: IpAddr) -> Classification {
        if self.is_dev(ip) {
            return Classification::Dev;
        }

        if self.blocked.iter().any(|r| r.contains(ip)) {
            return Classification::Blocked;
        }

        self.countries
            .iter()
            .find(|c| c.ranges.iter().any(|r| r.contains(ip)))
            .map(|c| Classification::CountryMatch {
                code: c.code.clone(),
                priority: c.priority,
            })
            .unwrap_or(Classification::Unknown)
    }
}
