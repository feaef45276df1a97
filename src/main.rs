//! Fn function gateway.
//!
//! ```text
//!                     ┌──────────────────────────────────────────┐
//!                     │               FDK GATEWAY                │
//!   Fn server         │  ┌────────┐   ┌───────────┐   ┌───────┐  │
//!   POST /call ───────┼─▶│  net   │──▶│ translate │──▶│forward│──┼──▶ Application
//!   (unix socket)     │  │listener│   │ (decode)  │   │       │  │    (HTTP)
//!                     │  └────────┘   └───────────┘   └───┬───┘  │
//!                     │                                   │      │
//!   200/502/504 ◀─────┼──────────── translate (encode) ◀──┘      │
//!   fn-http-status    │                                          │
//!                     └──────────────────────────────────────────┘
//! ```

use clap::Parser;

use fdk_gateway::config::Cli;
use fdk_gateway::net::ListenAddress;
use fdk_gateway::observability::logging;
use fdk_gateway::{GatewayServer, Shutdown, VERSION};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability)?;

    tracing::info!("fdk-gateway v{} starting", VERSION);
    tracing::info!(
        listener = %config.listener.address,
        root_path = %config.translator.root_path,
        upstream = %config.upstream.url,
        upstream_timeout_secs = config.upstream.timeout_secs,
        access_log = config.observability.access_log,
        "Configuration loaded"
    );

    let address: ListenAddress = config.listener.address.parse()?;
    let listener = address.bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = GatewayServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    Ok(())
}
