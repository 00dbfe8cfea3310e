#![cfg_attr(not(test), deny(clippy::panic))]

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use gomoku_server::config::{LogFormat, LoggingConfig, ServerConfig};
use gomoku_server::server::GameServer;
use gomoku_server::{logging, net};

/// Gomoku -- multi-room five-in-a-row game server
#[derive(Parser, Debug)]
#[command(name = "gomoku-server")]
#[command(about = "A multi-room Gomoku game server speaking line-delimited JSON over TCP")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "GOMOKU_HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 10000, env = "GOMOKU_PORT")]
    port: u16,

    /// Log level directive (overrides RUST_LOG)
    #[arg(long, env = "GOMOKU_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "GOMOKU_LOG_FORMAT")]
    log_format: LogFormat,

    /// Directory for rotated log files (stdout only when unset)
    #[arg(long, env = "GOMOKU_LOG_DIR")]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&LoggingConfig {
        level: cli.log_level.clone(),
        format: cli.log_format,
        dir: cli.log_dir.clone(),
    });

    let listener = TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    tracing::info!(host = %cli.host, port = cli.port, "Starting Gomoku server");

    let server = GameServer::new(ServerConfig::default());
    server.spawn_maintenance();

    tokio::select! {
        result = net::serve(Arc::clone(&server), listener) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping server");
            Ok(())
        }
    }
}
