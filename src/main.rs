use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use delivery_tracker::api;
use delivery_tracker::config::Config;
use delivery_tracker::engine::remote::FixtureOrders;
use delivery_tracker::error::AppError;
use delivery_tracker::state::AppState;
use delivery_tracker::storage::file::FileKeyValueStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let backend = Arc::new(FileKeyValueStore::new(config.data_dir.clone()));
    let (app_state, connectivity_rx) = AppState::new(
        backend,
        Arc::new(FixtureOrders::new()),
        config.refresh_min_visible,
        config.connectivity_buffer_size,
    );
    let shared_state = Arc::new(app_state);

    let listener_handle = shared_state.connectivity.clone().listen(connectivity_rx);
    shared_state.repository.initialize().await;

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        data_dir = %config.data_dir.display(),
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    listener_handle.shutdown().await;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
