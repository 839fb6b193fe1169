//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use condo_gateway::admin::serve_admin;
use condo_gateway::config::{parse_config, GatewayConfig};
use condo_gateway::security::capability::{sign_token, TokenClaims};
use condo_gateway::{Gateway, HttpServer, Shutdown};
use ed25519_dalek::SigningKey;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const ADMIN_KEY: &str = "test-admin-key";

pub const CONFIG: &str = r#"
[admin]
enabled = true
api_key = "test-admin-key"

[rate_limit]
requests_per_second = 100
burst_size = 100

[geo]
blocked_ips = ["198.51.100.0/24"]

[geo.development_ips]
ranges = ["10.0.0.0/8"]

[geo.allowed_countries.americas.countries.CO]
name = "Colombia"
priority = 1
language = "es"
ip_ranges = ["181.48.0.0/14"]

[geo.allowed_countries.europe.countries.ES]
name = "Spain"
priority = 1
language = "es"
ip_ranges = ["88.0.0.0/11"]

[registry.namespaces]
"Condo::Reports" = "modules/reports"

[registry.model_registry.residents]
path = "models/residents"
namespace = "Condo::Residents"
models = [
    { class = "Persona", file = "persona.model" },
    { class = "Dispositivo", file = "dispositivo.model" },
]

[registry.model_registry.vendors]
path = "models/vendors"
models = [{ class = "Proveedor", file = "proveedor.model" }]

[registry.model_registry.admin]
path = "models/admin"
namespace = "Condo::Admin"
models = [
    { class = "Admin", file = "admin.model" },
    { class = "NominaModel", file = "nomina.model" },
    { class = "EmpleadosUser", file = "empleados_user.model" },
]

[sensitivity.tiers]
Proveedor = "sensitive"
Admin = "admin_only"
NominaModel = "admin_only"
EmpleadosUser = "admin_only"
"#;

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

/// Sample config with the test signing key trusted.
pub fn test_config() -> GatewayConfig {
    let mut config = parse_config(CONFIG).unwrap();
    config
        .sensitivity
        .trusted_token_keys
        .push(hex::encode(signing_key().verifying_key().to_bytes()));
    config
}

pub fn gateway(config: GatewayConfig) -> Gateway {
    Gateway::builder(config).build().unwrap()
}

pub fn token_for(scope: &[&str], exp: u64) -> String {
    let claims = TokenClaims {
        sub: "ops@condo".into(),
        scope: scope.iter().map(|s| s.to_string()).collect(),
        exp,
    };
    sign_token(&signing_key(), &claims).unwrap()
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub gateway: Arc<Gateway>,
    pub config_tx: mpsc::UnboundedSender<GatewayConfig>,
    pub shutdown: Shutdown,
}

/// Start public and admin listeners on ephemeral loopback ports.
pub async fn start_server(config: GatewayConfig) -> TestServer {
    let gateway = Arc::new(gateway(config));
    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(gateway.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();
    let admin_shutdown = shutdown.subscribe();
    let admin_gateway = gateway.clone();
    tokio::spawn(async move {
        let _ = serve_admin(admin_listener, admin_gateway, admin_shutdown).await;
    });

    TestServer {
        addr,
        admin_addr,
        gateway,
        config_tx,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
