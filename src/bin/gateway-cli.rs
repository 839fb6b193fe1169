use clap::{Parser, Subcommand};
use ed25519_dalek::SigningKey;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use condo_gateway::clock::unix_secs;
use condo_gateway::security::capability::{sign_token, token_digest_hex, TokenClaims};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the condo resource gateway", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key
    #[arg(short, long, env = "GATEWAY_ADMIN_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// Global counters, cache occupancy and stage health
    Stats,
    /// Per-client telemetry
    Clients {
        /// Only this client address
        #[arg(long)]
        ip: Option<String>,
    },
    /// Inspect the resolution cache
    Cache,
    /// Clear cache and telemetry and reload configuration
    Reset,
    /// Resolve a resource through the public endpoint
    Resolve {
        name: String,
        /// Public endpoint base URL
        #[arg(long, default_value = "http://localhost:8080")]
        server: String,
        #[arg(long)]
        identity: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Sign a capability token with a hex ed25519 secret key
    MintToken {
        #[arg(long)]
        secret_key: String,
        #[arg(long)]
        subject: String,
        /// Resources the token covers; `*` for all
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: u64,
    },
    /// Print the SHA-256 digest to configure for an opaque token
    Digest { token: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    let admin = |path: &str| format!("{}/admin/{}", cli.url.trim_end_matches('/'), path);

    match cli.command {
        Commands::Status => {
            let res = client.get(admin("status")).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Stats => {
            let res = client.get(admin("stats")).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Clients { ip } => {
            let path = match ip {
                Some(ip) => format!("clients/{}", ip),
                None => "clients".to_string(),
            };
            let res = client.get(admin(&path)).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Cache => {
            let res = client.get(admin("cache")).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Reset => {
            let res = client.post(admin("reset")).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Resolve {
            name,
            server,
            identity,
            token,
        } => {
            let mut req = client.get(format!("{}/resources/{}", server.trim_end_matches('/'), name));
            if let Some(identity) = identity {
                req = req.header("x-client-identity", identity);
            }
            if let Some(token) = token {
                req = req.header("x-capability-token", token);
            }
            let res = req.send().await?;
            if let Some(denial) = res.headers().get("x-gateway-denial") {
                eprintln!("Denied: {}", denial.to_str().unwrap_or("<unprintable>"));
            }
            print_response(res).await?;
        }
        Commands::MintToken {
            secret_key,
            subject,
            scopes,
            ttl,
        } => {
            let seed: [u8; 32] = hex::decode(secret_key.trim())?
                .try_into()
                .map_err(|_| "secret key must be 32 bytes of hex")?;
            let key = SigningKey::from_bytes(&seed);
            let claims = TokenClaims {
                sub: subject,
                scope: scopes,
                exp: unix_secs() + ttl,
            };
            println!("token:      {}", sign_token(&key, &claims)?);
            println!("public key: {}", hex::encode(key.verifying_key().to_bytes()));
        }
        Commands::Digest { token } => {
            println!("{}", token_digest_hex(&token));
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if !text.is_empty() => println!("{}", text),
        Err(_) => {}
    }
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }
    Ok(())
}
