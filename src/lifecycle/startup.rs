//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, metrics and the gateway in dependency order
//! - Start the config watcher and the admin listener
//! - Bind the public listener last and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::admin::serve_admin;
use crate::config::{load_config, ConfigError, ConfigWatcher};
use crate::gateway::{Gateway, GatewayError};
use crate::http::HttpServer;
use crate::lifecycle::{shutdown_signal, Shutdown};
use crate::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),
    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the gateway process described by the config file at `path`.
pub async fn run(path: &Path) -> Result<(), StartupError> {
    let config = load_config(path)?;
    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %path.display(),
        "condo-gateway starting"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            init_metrics(addr);
        }
    }

    let gateway = Arc::new(Gateway::builder(config.clone()).config_path(path).build()?);

    let (watcher, config_updates) = ConfigWatcher::new(path);
    let _watcher = watcher.run()?;

    let shutdown = Shutdown::new();

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let admin_gateway = gateway.clone();
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = serve_admin(admin_listener, admin_gateway, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_shutdown.trigger();
    });

    HttpServer::new(gateway)
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
