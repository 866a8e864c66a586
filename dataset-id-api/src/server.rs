//! Server setup and lifecycle for the Dataset ID API.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::ServiceConfig;
use crate::error::{ApiError, Result};
use crate::routes::create_router;
use crate::state::AppState;

/// The Dataset ID API server.
pub struct DatasetApiServer {
    state: Arc<AppState>,
}

impl DatasetApiServer {
    /// Creates a new server instance with the given configuration.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let state = Arc::new(AppState::new(config)?);
        Ok(Self { state })
    }

    /// Runs the HTTP server.
    ///
    /// This method blocks until the server is shut down (e.g., via Ctrl+C).
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.state.config.host, self.state.config.port)
            .parse()
            .map_err(|e| ApiError::Configuration(format!("Invalid address: {e}")))?;

        let router = create_router(self.state.clone());

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("Failed to bind to {addr}: {e}")))?;

        tracing::info!(
            %addr,
            upstream = %self.state.upstream.catalog_url(),
            fan_out = self.state.aggregator.fan_out(),
            "Dataset ID API server starting"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Server(format!("Server error: {e}")))?;

        tracing::info!("Dataset ID API server stopped");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

/// Signal handler for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        () = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}

/// Entry point for running the server from configuration.
pub async fn run_server(config: ServiceConfig) -> Result<()> {
    let server = DatasetApiServer::new(config)?;
    server.run().await
}

/// Entry point for running the server from the config file and environment.
///
/// Installs the tracing subscriber (`RUST_LOG`, default `info`) first.
pub async fn run_from_env() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::load()?;
    run_server(config).await
}
