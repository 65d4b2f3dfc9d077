//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p fotio-api --test serve_test` or
//! `cargo test -p fotio-api`. Tests run against a tempdir-backed local
//! provider; no external services required.

use std::path::PathBuf;
use std::sync::Arc;

use axum_test::TestServer;
use fotio_api::setup::routes;
use fotio_api::state::AppState;
use fotio_core::config::{BaseConfig, CacheConfig};
use fotio_core::{Config, ProviderSettings};
use fotio_storage::StorageManager;
use tempfile::TempDir;

/// Test application: server plus the tempdir backing the local provider.
pub struct TestApp {
    pub server: TestServer,
    pub storage_root: PathBuf,
    _temp_dir: TempDir,
}

pub fn test_config(providers: Vec<ProviderSettings>) -> Config {
    Config {
        base: BaseConfig {
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            request_timeout_secs: 30,
            storage_timeout_secs: 5,
        },
        cache: CacheConfig {
            image_max_age_secs: 31_536_000,
            image_swr_secs: 86_400,
            thumbnail_max_age_secs: 15_552_000,
            thumbnail_swr_secs: 86_400,
            api_payload_max_age_secs: 300,
            api_payload_swr_secs: 60,
        },
        providers,
    }
}

/// Setup test app with an isolated local storage root.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().expect("create temp storage dir");
    let providers = vec![ProviderSettings::Local {
        root: temp_dir.path().to_path_buf(),
        base_url: "http://localhost:4000/storage/serve/local".to_string(),
    }];

    let config = test_config(providers);
    let storage = Arc::new(StorageManager::new(
        config.providers().to_vec(),
        config.storage_timeout(),
    ));
    let state = Arc::new(AppState::new(config.clone(), storage));

    let app = routes::setup_routes(&config, state).expect("setup routes");
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        storage_root: temp_dir.path().to_path_buf(),
        server,
        _temp_dir: temp_dir,
    }
}

/// Drop fixture bytes into the local provider's root.
pub fn write_fixture(app: &TestApp, key: &str, bytes: &[u8]) {
    let path = app.storage_root.join(key);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dirs");
    }
    std::fs::write(path, bytes).expect("write fixture");
}
