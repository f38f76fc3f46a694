//! Delay Prediction HTTP Server Binary
//!
//! Loads configuration, builds the repository and the initial dataset
//! snapshot, then serves the REST API.
//!
//! # Usage
//!
//! ```bash
//! # Serve CSV exports
//! DELAY_CONFIG=backend/delay.toml cargo run --bin delay-server
//!
//! # Start empty with the in-memory repository and POST data later
//! cargo run --bin delay-server --no-default-features --features "local-repo,http-server"
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `DELAY_CONFIG`: Path to `delay.toml` (default: search standard locations)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use transit_delay::config::AppConfig;
use transit_delay::db::{self, RepositoryFactory};
use transit_delay::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; `log` records from the library are bridged in.
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting delay prediction server");

    let config = AppConfig::load()?;
    let repository = RepositoryFactory::create(&config)?;
    info!("Repository initialized: {}", repository.backend_name());

    let snapshot = db::load_snapshot(repository.as_ref(), config.engine.event_window()).await?;

    let state = AppState::new(repository, config, snapshot);
    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
