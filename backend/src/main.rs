//! Main entry point for the Fluxoo backend.
//!
//! This file reads the configuration, picks the hosted or in-memory backend,
//! restores any existing session and serves the shell API with axum.

use std::sync::Arc;

use adapters::{CredentialStore, HostedBackend, MemoryBackend, ProfileDirectory};
use backend::config::Config;
use backend::errors::AppError;
use backend::{app, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let (store, directory): (Arc<dyn CredentialStore>, Arc<dyn ProfileDirectory>) = match &config.store {
        Some(store) => {
            tracing::info!("using hosted backend at {}", store.url);
            let hosted = Arc::new(HostedBackend::new(&store.url, &store.api_key, config.tables.clone()));
            let credentials: Arc<dyn CredentialStore> = hosted.clone();
            let profiles: Arc<dyn ProfileDirectory> = hosted;
            (credentials, profiles)
        }
        None => {
            tracing::warn!("FLUXOO_STORE_URL not set, running on an empty in-memory backend");
            let memory = Arc::new(MemoryBackend::new());
            let credentials: Arc<dyn CredentialStore> = memory.clone();
            let profiles: Arc<dyn ProfileDirectory> = memory;
            (credentials, profiles)
        }
    };

    let state = AppState::new(&config, store, directory);
    let listener_task = state.session.start().await;

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!("listening on {}", config.http_addr);
    let served = axum::serve(listener, app(state)).await;

    listener_task.abort();
    served.map_err(AppError::from)
}
