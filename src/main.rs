use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use taskdesk_server::config::{generate_config_template, Config};
use taskdesk_server::ws::registry::ConnectionRegistry;
use taskdesk_server::ws::rooms::RoomManager;
use taskdesk_server::{auth, db, routes, state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "taskdesk_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "taskdesk_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("TaskDesk server v{} starting", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite database
    let db = db::init_db(&config.data_dir)?;

    // Load or generate JWT signing key (256-bit random, stored in data_dir)
    let jwt_secret = auth::jwt::load_or_generate_jwt_secret(&config.data_dir)?;

    if config.dev_mode {
        tracing::warn!("Development mode enabled: access codes are echoed in API responses");
    }

    let app_state = state::AppState {
        db,
        jwt_secret,
        connections: Arc::new(ConnectionRegistry::new()),
        rooms: Arc::new(RoomManager::new()),
        dev_mode: config.dev_mode,
        frontend_url: config.frontend_url.clone(),
    };

    let app = routes::build_router(app_state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
