use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use aegis::config;
use aegis::server::{build_router, AppState};
use aegis::table::LicenseTable;

#[tokio::main]
async fn main() {
    // Configuration first: fail fast on missing secrets.
    let config = match config::init_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if config.logging.enabled {
        let level = config
            .logging
            .level
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO);
        tracing_subscriber::fmt().with_max_level(level).init();
    }

    let table = Arc::new(LicenseTable::new());
    let state = AppState::new(table, config);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .expect("invalid server.host/server.port");

    info!("Aegis License Server listening on http://{addr}");
    info!("License check endpoint: http://{addr}/check_license");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind server address");
    axum::serve(listener, app)
        .await
        .expect("server terminated unexpectedly");
}
