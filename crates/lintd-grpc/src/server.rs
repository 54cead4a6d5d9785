//! Server configuration and runner.

use std::net::SocketAddr;

use lintd::BasicEngine;

use crate::proto::standalone_analyzer_server::StandaloneAnalyzerServer;
use crate::service::{AnalyzerService, DEFAULT_LOG_BUFFER, DEFAULT_STREAM_BUFFER};

/// Settings for [`AnalyzerServer`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,
    /// Capacity of each issue stream
    pub stream_buffer: usize,
    /// Capacity of the log stream
    pub log_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 1], 50051)),
            stream_buffer: DEFAULT_STREAM_BUFFER,
            log_buffer: DEFAULT_LOG_BUFFER,
        }
    }
}

/// Runs the analyzer service with the built-in engine.
#[derive(Debug)]
pub struct AnalyzerServer {
    config: ServerConfig,
}

impl AnalyzerServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Run the server until shutdown signal.
    pub async fn run(self) -> Result<(), tonic::transport::Error> {
        let service = AnalyzerService::<BasicEngine>::with_buffers(
            self.config.stream_buffer,
            self.config.log_buffer,
        );

        tracing::info!("Starting gRPC server on {}", self.config.addr);

        tonic::transport::Server::builder()
            .add_service(StandaloneAnalyzerServer::new(service))
            .serve_with_shutdown(self.config.addr, shutdown_signal())
            .await?;

        tracing::info!("gRPC server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                // Fall through to let ctrl_c handle shutdown
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
