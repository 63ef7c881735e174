use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sparrow_lifecycle::{
    config::AppConfig,
    state::AppState,
    triggers::{RIDES_AUTO_EXPIRE, http::router, scheduler::spawn_ticker},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(config).await?;
    let dispatcher = Arc::new(app_state.dispatcher());

    let ticker = if app_state.config.sweep_interval.is_zero() {
        tracing::info!("In-process sweep ticker disabled");
        None
    } else {
        Some(spawn_ticker(
            dispatcher.clone(),
            RIDES_AUTO_EXPIRE,
            app_state.config.sweep_interval,
        ))
    };

    let listener = tokio::net::TcpListener::bind(&app_state.config.bind_addr).await?;
    tracing::info!("Listening on {}", app_state.config.bind_addr);
    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(ticker) = ticker {
        ticker.abort();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("Shutting down");
}
