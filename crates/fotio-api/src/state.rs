//! Application state.
//!
//! One long-lived state value owned by the composition root and injected
//! into handlers via Axum's `State`; no module-level singletons.

use std::sync::Arc;

use fotio_core::Config;
use fotio_storage::StorageManager;

use crate::cache::CachePolicy;

/// Main application state: the provider registry, the static cache-policy
/// table, and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<StorageManager>,
    pub cache: CachePolicy,
    pub is_production: bool,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<StorageManager>) -> Self {
        let cache = CachePolicy::from_config(&config.cache);
        let is_production = config.is_production();
        AppState {
            config,
            storage,
            cache,
            is_production,
        }
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
