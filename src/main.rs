//! condo-gateway server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────────┐
//!                     │                    GATEWAY                         │
//!   GET /resources/x  │  ┌────────┐   ┌──────┐   ┌──────┐   ┌───────────┐  │
//!   ──────────────────┼─▶│  http  │──▶│ geo  │──▶│ rate │──▶│   cache   │  │
//!                     │  │ server │   └──────┘   └──────┘   └─────┬─────┘  │
//!                     │  └────────┘                    miss │     │ hit    │
//!                     │                                     ▼     │        │
//!                     │                          ┌─────────────┐  │        │
//!                     │                          │ sensitivity │◀─┘        │
//!                     │                          │    gate     │           │
//!                     │                          └──────┬──────┘           │
//!                     │                                 ▼                  │
//!   SecurityDecision  │  ┌──────────┐           ┌─────────────┐            │
//!   ◀─────────────────┼──│telemetry │◀──────────│  registry   │            │
//!                     │  └──────────┘           └─────────────┘            │
//!                     │                                                    │
//!                     │  config + watcher │ admin API │ metrics │ logging  │
//!                     └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "condo-gateway")]
#[command(about = "Secure resource resolution gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    condo_gateway::lifecycle::startup::run(&args.config).await?;
    Ok(())
}
