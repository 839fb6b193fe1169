//! Resource name resolution.
//!
//! # Responsibilities
//! - Exact lookup of registered model classes
//! - Namespace-prefix fallback (longest prefix wins)
//! - Fallback names never get a looser tier than the registered model they
//!   alias (same file, or same trailing class name)
//! - Reject duplicate class names when the registry is built
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) exact lookup via HashMap
//! - O(n) prefix scan over namespaces sorted longest first
//! - Explicit NotFound rather than silent default

use std::collections::HashMap;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use serde::Serialize;

use crate::config::{RegistryConfig, SensitivityConfig, SensitivityTier};

/// A resolved resource. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub category: String,
    pub file_path: PathBuf,
    pub namespace: String,
    pub sensitivity_tier: SensitivityTier,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("resource '{name}' registered in both '{first}' and '{second}'")]
    Duplicate {
        name: String,
        first: String,
        second: String,
    },
}

/// Lookup failure for a name with no registry entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("resource '{0}' not found")]
pub struct NotFound(pub String);

#[derive(Debug, Clone)]
struct NamespaceRoot {
    prefix: String,
    base_path: PathBuf,
}

/// Immutable name → descriptor index.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    exact: HashMap<String, ResourceDescriptor>,
    by_file: HashMap<PathBuf, SensitivityTier>,
    namespaces: Vec<NamespaceRoot>,
    separator: String,
    extension: String,
    tiers: HashMap<String, SensitivityTier>,
    default_tier: SensitivityTier,
}

impl ResourceRegistry {
    pub fn from_config(
        config: &RegistryConfig,
        sensitivity: &SensitivityConfig,
    ) -> Result<Self, RegistryError> {
        let tiers: HashMap<String, SensitivityTier> = sensitivity
            .tiers
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let tier_of = |name: &str| tiers.get(name).copied().unwrap_or(sensitivity.default_tier);

        let mut exact: HashMap<String, ResourceDescriptor> = HashMap::new();
        for (category, entry) in &config.model_registry {
            for model in &entry.models {
                if let Some(existing) = exact.get(&model.class) {
                    return Err(RegistryError::Duplicate {
                        name: model.class.clone(),
                        first: existing.category.clone(),
                        second: category.clone(),
                    });
                }
                exact.insert(
                    model.class.clone(),
                    ResourceDescriptor {
                        name: model.class.clone(),
                        category: category.clone(),
                        file_path: PathBuf::from(&entry.path).join(&model.file),
                        namespace: entry.namespace.clone(),
                        sensitivity_tier: tier_of(&model.class),
                    },
                );
            }
        }

        let by_file = exact
            .values()
            .map(|d| (d.file_path.clone(), d.sensitivity_tier))
            .collect();

        let mut namespaces: Vec<NamespaceRoot> = config
            .namespaces
            .iter()
            .filter(|(prefix, _)| !prefix.is_empty())
            .map(|(prefix, base)| NamespaceRoot {
                prefix: prefix.clone(),
                base_path: PathBuf::from(base),
            })
            .collect();
        namespaces.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        tracing::debug!(
            exact = exact.len(),
            namespaces = namespaces.len(),
            "Resource registry built"
        );

        Ok(Self {
            exact,
            by_file,
            namespaces,
            separator: config.namespace_separator.clone(),
            extension: config.file_extension.trim_start_matches('.').to_string(),
            tiers,
            default_tier: sensitivity.default_tier,
        })
    }

    /// Resolve `name` to a descriptor.
    pub fn resolve(&self, name: &str) -> Result<ResourceDescriptor, NotFound> {
        if let Some(descriptor) = self.exact.get(name) {
            return Ok(descriptor.clone());
        }
        self.resolve_by_namespace(name)
            .ok_or_else(|| NotFound(name.to_string()))
    }

    fn resolve_by_namespace(&self, name: &str) -> Option<ResourceDescriptor> {
        let sep = self.separator.as_str();
        // Prefixes only match on a segment boundary: "condo" does not own "condominium::X".
        let root = self.namespaces.iter().find(|ns| {
            name.strip_prefix(ns.prefix.as_str()).is_some_and(|rest| {
                sep.is_empty() || ns.prefix.ends_with(sep) || rest.starts_with(sep)
            })
        })?;

        let rest = &name[root.prefix.len()..];
        let (rest, relative) = if sep.is_empty() {
            (rest, rest.to_string())
        } else {
            let rest = rest.trim_start_matches(sep);
            (rest, rest.replace(sep, MAIN_SEPARATOR_STR))
        };
        if rest.is_empty() {
            return None;
        }
        // Names must not escape the namespace root.
        if relative
            .split(MAIN_SEPARATOR_STR)
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return None;
        }

        let file_name = if self.extension.is_empty() {
            relative
        } else {
            format!("{}.{}", relative, self.extension)
        };
        let file_path = root.base_path.join(file_name);
        let class = if sep.is_empty() {
            rest
        } else {
            rest.rsplit(sep).next().unwrap_or(rest)
        };

        Some(ResourceDescriptor {
            name: name.to_string(),
            category: root.prefix.clone(),
            sensitivity_tier: self.fallback_tier(name, class, &file_path),
            file_path,
            namespace: root.prefix.clone(),
        })
    }

    /// Strictest of the tier configured for `name` and the tiers of any
    /// registered model sharing its file or trailing class name.
    fn fallback_tier(&self, name: &str, class: &str, file_path: &Path) -> SensitivityTier {
        let own = self.tiers.get(name).copied().unwrap_or(self.default_tier);
        let by_class = self.exact.get(class).map(|d| d.sensitivity_tier);
        let by_file = self.by_file.get(file_path).copied();

        [Some(own), by_class, by_file]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(own)
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}
