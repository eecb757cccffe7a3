//! gemini-relay
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!   Client request       │                 GEMINI RELAY                 │
//!   ─────────────────────┼─▶ http (request ID, body limit, CORS)        │
//!                        │        │                                     │
//!                        │        ▼                                     │
//!                        │   relay handler ──▶ auth ──────────────────┼──▶ Auth service
//!                        │        │                                     │
//!                        │        ▼                                     │
//!                        │   upstream client (+ server API key) ──────┼──▶ Generative API
//!                        │        │                                     │
//!   Client response      │        ▼                                     │
//!   ◀────────────────────┼── RelayOutcome → JSON response               │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gemini_relay::config::load_config;
use gemini_relay::lifecycle::signals;
use gemini_relay::observability::{logging, metrics};
use gemini_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "gemini-relay")]
#[command(about = "Authenticated relay to the Gemini generateContent API", long_about = None)]
struct Args {
    /// Path to a TOML config file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    logging::init(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        "gemini-relay starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
