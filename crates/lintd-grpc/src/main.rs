//! lintd gRPC daemon
//!
//! Serves the StandaloneAnalyzer service, streaming analysis issues and
//! engine log lines to connected clients.

use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lintd_grpc::{AnalyzerServer, DEFAULT_LOG_BUFFER, DEFAULT_STREAM_BUFFER, ServerConfig};

/// lintd gRPC daemon - streams static-analysis results over gRPC
#[derive(Parser, Debug)]
#[command(name = "lintd-grpc")]
#[command(about = "gRPC daemon running lintd analyses")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "[::1]:50051")]
    addr: SocketAddr,

    /// Issues buffered per analysis stream before the engine waits
    #[arg(long, default_value_t = DEFAULT_STREAM_BUFFER)]
    stream_buffer: usize,

    /// Log events buffered before new ones are dropped
    #[arg(long, default_value_t = DEFAULT_LOG_BUFFER)]
    log_buffer: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();

    let server = AnalyzerServer::new(ServerConfig {
        addr: args.addr,
        stream_buffer: args.stream_buffer,
        log_buffer: args.log_buffer,
    });
    server.run().await?;

    Ok(())
}
