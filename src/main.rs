//! Trail recorder server

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use trail_recorder::{
    config::AppConfig, database::Database, errors::TrailRecorderError, routes::create_router,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), TrailRecorderError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration, preferring environment variables and config files
    let config = AppConfig::load()?;
    config.validate()?;

    let database = Database::open(&config.database).await?;
    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("Listening on {}", config.server.bind);

    let state = Arc::new(AppState::new(config, database.clone())?);
    let app = create_router(state);

    // Setup signal handling for graceful shutdown
    let shutdown_signal = signal::ctrl_c();

    tokio::select! {
        result = serve(listener, app) => {
            info!("Server stopped: {:?}", result);
        }
        _ = shutdown_signal => {
            info!("Received shutdown signal");
        }
    }

    database.close().await?;
    Ok(())
}

async fn serve(listener: TcpListener, app: axum::Router) -> Result<(), TrailRecorderError> {
    axum::serve(listener, app).await?;
    Ok(())
}
