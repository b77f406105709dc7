//! Minimal rate-limited HTTP relay proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     RELAY PROXY                      │
//!                      │                                                      │
//!   Client Request     │  ┌──────────┐   ┌────────────┐   ┌──────────────┐   │
//!   ───────────────────┼─▶│  http    │──▶│  security  │──▶│ secret       │   │
//!                      │  │  server  │   │ rate limit │   │ bypass check │   │
//!                      │  └──────────┘   └─────┬──────┘   └──────┬───────┘   │
//!                      │                  429 ◀┘          200 ◀──┤           │
//!                      │                                         ▼           │
//!   Client Response    │  ┌──────────┐   ┌────────────┐   ┌──────────────┐   │
//!   ◀──────────────────┼──│ response │◀──│  outcome   │◀──│  forwarding  │◀──┼── Destination
//!                      │  │  relay   │   │ classifier │   │    engine    │   │
//!                      │  └──────────┘   └────────────┘   └──────────────┘   │
//!                      │                                                      │
//!                      │   config · observability · lifecycle                 │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use relay_proxy::config;
use relay_proxy::lifecycle::{signals, Shutdown};
use relay_proxy::observability::{logging, metrics};
use relay_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "relay-proxy")]
#[command(about = "Rate-limited HTTP relay to a single destination", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration, print it and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    if cli.check {
        println!("{}", toml::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    let _log_guard = logging::init(&config.logging)?;

    tracing::info!("relay-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        destination = %config.upstream.destination_url,
        mode = ?config.routing.mode,
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
