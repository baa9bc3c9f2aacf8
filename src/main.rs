use anyhow::Result;
use std::sync::Arc;

use datasage::{app, config, logging, services, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::Config::new()?;
    tracing::info!("Starting DataSage in {} mode", config.environment);

    let insights = services::insights::from_config(&config)?;
    let addr = config.bind_addr;

    // Build our application state
    let state = Arc::new(AppState::new(config, insights));
    let app = app(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
