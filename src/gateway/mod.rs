//! Gateway coordinator.
//!
//! # Data Flow
//! ```text
//! resolve_resource(ip, name, metadata)
//!     → geo classifier      (deny Blocked / Unknown)
//!     → rate budget         (deny when exceeded)
//!     → resolution cache    (hit: gate non-public tiers, return)
//!     → sensitivity gate    (Sensitive / AdminOnly only)
//!     → resource registry   (NotFound is not a denial)
//!     → cache insert + telemetry
//!     → SecurityDecision
//! ```
//!
//! # Design Decisions
//! - No globals: collaborators are injected or built from config
//! - Config-derived state lives behind `ArcSwap`; a request works on one
//!   snapshot from start to finish
//! - Collaborators that fail to build are handled per the explicit
//!   `dependencies.on_failure` policy (fail-closed by default)

pub mod decision;
pub mod metadata;
mod pipeline;
mod stage;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::cache::{CacheEntry, ResolutionCache};
use crate::config::{load_config, validate_config, ConfigError, GatewayConfig};
use crate::geo::{ClientClassifier, GeoClassifier};
use crate::registry::{RegistryError, ResourceRegistry};
use crate::security::{RateBudget, SensitivityGate, TokenBucketBudget, TokenError};
use crate::telemetry::{ClientReport, TelemetryStore, TelemetryTotals};

pub use decision::{AlertSeverity, ClientIdentity, DecisionTier, SecurityDecision};
pub use metadata::RequestMetadata;
pub use stage::DependencyInitError;

use stage::Stage;

/// Fatal gateway construction / reload errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("capability credentials: {0}")]
    Credentials(#[from] TokenError),
}

/// Everything derived from one configuration.
pub(crate) struct GatewayState {
    pub(crate) config: Arc<GatewayConfig>,
    pub(crate) classifier: Stage<dyn ClientClassifier>,
    pub(crate) budget: Stage<dyn RateBudget>,
    pub(crate) gate: SensitivityGate,
    pub(crate) registry: ResourceRegistry,
    pub(crate) cache: ResolutionCache,
    pub(crate) generation: u64,
}

/// Process-wide aggregate view.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub generation: u64,
    pub registry_entries: usize,
    pub cache_entries: usize,
    pub cache_capacity: usize,
    pub classifier: &'static str,
    pub rate_budget: &'static str,
    pub telemetry: TelemetryTotals,
}

/// Builder for [`Gateway`].
pub struct GatewayBuilder {
    config: GatewayConfig,
    classifier: Option<Arc<dyn ClientClassifier>>,
    budget: Option<Arc<dyn RateBudget>>,
    config_path: Option<PathBuf>,
}

impl GatewayBuilder {
    /// Use `classifier` instead of building one from `geo` config.
    pub fn classifier(mut self, classifier: Arc<dyn ClientClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Use `budget` instead of the bundled token bucket.
    pub fn rate_budget(mut self, budget: Arc<dyn RateBudget>) -> Self {
        self.budget = Some(budget);
        self
    }

    /// File `reset()` reloads configuration from.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Gateway, GatewayError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let state = build_state(
            self.config,
            1,
            None,
            self.classifier.as_ref(),
            self.budget.as_ref(),
        )?;

        tracing::info!(
            registry_entries = state.registry.len(),
            classifier = state.classifier.status(),
            rate_budget = state.budget.status(),
            on_failure = ?state.config.dependencies.on_failure,
            "Gateway initialized"
        );

        Ok(Gateway {
            state: ArcSwap::from_pointee(state),
            telemetry: TelemetryStore::new(),
            classifier: self.classifier,
            budget: self.budget,
            config_path: self.config_path,
            generation: AtomicU64::new(1),
            reload: Mutex::new(()),
        })
    }
}

fn build_state(
    config: GatewayConfig,
    generation: u64,
    previous: Option<&GatewayState>,
    classifier: Option<&Arc<dyn ClientClassifier>>,
    budget: Option<&Arc<dyn RateBudget>>,
) -> Result<GatewayState, GatewayError> {
    let classifier: Stage<dyn ClientClassifier> = match classifier {
        Some(injected) => Stage::Ready(injected.clone()),
        None => Stage::from_init(
            GeoClassifier::from_config(&config.geo)
                .map(|geo| Arc::new(geo) as Arc<dyn ClientClassifier>),
        ),
    };

    let budget: Stage<dyn RateBudget> = match budget {
        Some(injected) => Stage::Ready(injected.clone()),
        None if !config.rate_limit.enabled => Stage::Disabled,
        None => match previous {
            // Keep bucket state across reloads that leave the limits alone.
            Some(prev) if prev.config.rate_limit == config.rate_limit => prev.budget.clone(),
            _ => Stage::from_init(
                TokenBucketBudget::new(&config.rate_limit)
                    .map(|b| Arc::new(b) as Arc<dyn RateBudget>),
            ),
        },
    };

    let gate = SensitivityGate::from_config(&config.sensitivity)?;
    let registry = ResourceRegistry::from_config(&config.registry, &config.sensitivity)?;
    let cache = ResolutionCache::new(&config.cache);

    Ok(GatewayState {
        config: Arc::new(config),
        classifier,
        budget,
        gate,
        registry,
        cache,
        generation,
    })
}

/// The secure resource resolution gateway.
pub struct Gateway {
    state: ArcSwap<GatewayState>,
    telemetry: TelemetryStore,
    classifier: Option<Arc<dyn ClientClassifier>>,
    budget: Option<Arc<dyn RateBudget>>,
    config_path: Option<PathBuf>,
    generation: AtomicU64,
    /// Serializes reloads so generations are stored in order.
    reload: Mutex<()>,
}

impl Gateway {
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder {
            config,
            classifier: None,
            budget: None,
            config_path: None,
        }
    }

    /// Load configuration from `path` and build a gateway that reloads
    /// from the same file on `reset()`.
    pub fn from_path(path: &Path) -> Result<Self, GatewayError> {
        let config = load_config(path)?;
        Self::builder(config).config_path(path).build()
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<GatewayConfig> {
        self.state.load().config.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state.load().generation
    }

    /// Swap in a new configuration. The cache starts empty; telemetry is kept.
    pub fn apply_config(&self, config: GatewayConfig) -> Result<(), GatewayError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let _guard = self.reload.lock().expect("reload mutex poisoned");
        let previous = self.state.load_full();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let state = build_state(
            config,
            generation,
            Some(&previous),
            self.classifier.as_ref(),
            self.budget.as_ref(),
        )?;

        tracing::info!(
            generation,
            registry_entries = state.registry.len(),
            classifier = state.classifier.status(),
            rate_budget = state.budget.status(),
            "Gateway configuration applied"
        );
        self.state.store(Arc::new(state));
        Ok(())
    }

    /// Clear cache, telemetry and request budgets, then reload configuration
    /// (from disk when the gateway was built from a path).
    ///
    /// On a load error nothing is cleared.
    pub fn reset(&self) -> Result<(), GatewayError> {
        let config = match &self.config_path {
            Some(path) => load_config(path)?,
            None => GatewayConfig::clone(&self.config()),
        };

        self.telemetry.clear();
        if let Stage::Ready(budget) = &self.state.load().budget {
            budget.reset();
        }
        self.apply_config(config)?;

        tracing::info!("Gateway state reset");
        Ok(())
    }

    pub fn client_stats(&self, ip: &str) -> Option<ClientReport> {
        self.telemetry.client(ip)
    }

    pub fn all_client_stats(&self) -> BTreeMap<String, ClientReport> {
        self.telemetry.all()
    }

    pub fn global_stats(&self) -> GlobalStats {
        let state = self.state.load();
        GlobalStats {
            generation: state.generation,
            registry_entries: state.registry.len(),
            cache_entries: state.cache.len(),
            cache_capacity: state.cache.max_entries(),
            classifier: state.classifier.status(),
            rate_budget: state.budget.status(),
            telemetry: self.telemetry.totals(),
        }
    }

    /// Cached resolutions, newest first.
    pub fn cache_snapshot(&self) -> Vec<CacheEntry> {
        self.state.load().cache.snapshot()
    }

    pub(crate) fn telemetry(&self) -> &TelemetryStore {
        &self.telemetry
    }

    pub(crate) fn current_state(&self) -> Arc<GatewayState> {
        self.state.load_full()
    }
}
