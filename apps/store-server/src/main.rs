//! Store server binary: load config, bind, serve until ctrl-c.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use store_server::config::ServerConfig;
use store_server::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting branch store server...");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    let state = server::build_state(&config);

    let listener = TcpListener::bind(config.bind_address()).await?;
    server::serve(state, listener, shutdown_signal()).await?;

    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
