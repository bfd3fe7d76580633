//! Toolgate HTTP server - main entry point.
//!
//! Loads configuration from the environment, connects the graph driver when
//! configured, and serves discovery, invocation and health endpoints until
//! SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use toolgate::server::GatewayServer;
use toolgate::tools::ToolRegistry;
use toolgate::Config;

/// Tool-invocation gateway.
#[derive(Debug, Parser)]
#[command(name = "toolgate", version, about)]
struct Cli {
    /// Bind address, overrides TOOLGATE_LISTEN_ADDR / PORT.
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Print the tool catalog as JSON and exit.
    #[arg(long)]
    list_tools: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    toolgate::observability::init_tracing(&config.logging);
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen.to_string();
    }

    if cli.list_tools {
        let catalog = toolgate::tools::builtin_catalog()?;
        let tools: Vec<_> = catalog.list_entries().iter().map(|e| e.descriptor()).collect();
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    tracing::debug!(?config, "configuration loaded");
    if config.rest.base_url.is_none() {
        tracing::warn!("MANIFEST_API_URL not set; inventory and incident tools will fail");
    }

    let addr: SocketAddr = config.server.listen_addr.parse()?;
    let registry = Arc::new(ToolRegistry::from_config(&config).await?);
    let server = GatewayServer::new(registry);

    let cancel = server.cancellation_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received");
        cancel.cancel();
    });

    tracing::info!("🚀 toolgate starting on {}", addr);
    server.serve(addr).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
