//! groomqd — the groomq daemon.
//!
//! Single binary that assembles the waiting-list backend:
//! - Queue store (redb)
//! - REST API
//!
//! # Usage
//!
//! ```text
//! groomqd serve --port 8690 --data-dir /var/lib/groomq
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "groomqd", about = "groomq waiting-list daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8690")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/groomq")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,groomqd=debug,groomq=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, data_dir } => run_serve(port, data_dir).await,
    }
}

async fn run_serve(port: u16, data_dir: PathBuf) -> anyhow::Result<()> {
    info!("groomq daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("groomq.redb");

    let store = groomq_state::QueueStore::open(&db_path)?;
    info!(path = ?db_path, "queue store opened");

    let router = groomq_api::build_router(store);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
    });

    server.await?;

    info!("groomq daemon stopped");
    Ok(())
}
