//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from
//! main.rs for better organization and testability.

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use fotio_core::Config;
use fotio_storage::StorageManager;

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    if config.providers().is_empty() {
        tracing::warn!(
            "No storage providers configured; every serve request will fail. \
             Set LOCAL_STORAGE_PATH, S3_BUCKET, or GDRIVE_CLIENT_ID."
        );
    } else {
        tracing::info!(
            providers = %config
                .configured_kinds()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            "Storage providers configured"
        );
    }

    let storage = Arc::new(StorageManager::new(
        config.providers().to_vec(),
        config.storage_timeout(),
    ));

    let state = Arc::new(AppState::new(config.clone(), storage));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
