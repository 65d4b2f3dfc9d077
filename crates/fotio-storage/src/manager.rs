//! Provider registry.
//!
//! The StorageManager owns the lifecycle of provider clients: lazily
//! constructed from the active configuration on first use, cached for the
//! process lifetime, and dropped when configuration changes. It owns no
//! business logic; all I/O delegates to the clients.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fotio_core::{ProviderKind, ProviderSettings};

use crate::drive::DriveProvider;
use crate::local::LocalProvider;
use crate::s3::S3Provider;
use crate::token::DriveCredentials;
use crate::traits::{ProviderClient, StorageError, StorageResult};

pub struct StorageManager {
    configs: std::sync::RwLock<HashMap<ProviderKind, ProviderSettings>>,
    // tokio lock: held across async client construction so concurrent first
    // calls build exactly one instance (and validate credentials once).
    clients: tokio::sync::RwLock<HashMap<ProviderKind, Arc<dyn ProviderClient>>>,
    timeout: Duration,
}

impl StorageManager {
    pub fn new(providers: Vec<ProviderSettings>, timeout: Duration) -> Self {
        let configs = providers.into_iter().map(|p| (p.kind(), p)).collect();
        StorageManager {
            configs: std::sync::RwLock::new(configs),
            clients: tokio::sync::RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Kinds with an active configuration record.
    pub fn configured_kinds(&self) -> Vec<ProviderKind> {
        let configs = self.configs.read().expect("configs lock poisoned");
        let mut kinds: Vec<ProviderKind> = ProviderKind::ALL
            .into_iter()
            .filter(|kind| configs.contains_key(kind))
            .collect();
        kinds.sort_by_key(|k| k.to_string());
        kinds
    }

    /// The client for a provider kind, constructing and caching it on first
    /// use. Unconfigured kinds fail with a configuration error.
    pub async fn provider(&self, kind: ProviderKind) -> StorageResult<Arc<dyn ProviderClient>> {
        if let Some(client) = self.clients.read().await.get(&kind) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        // Double-checked: another task may have built it while we waited.
        if let Some(client) = clients.get(&kind) {
            return Ok(client.clone());
        }

        let settings = {
            let configs = self.configs.read().expect("configs lock poisoned");
            configs.get(&kind).cloned().ok_or_else(|| {
                StorageError::Config(format!("no active configuration for provider '{}'", kind))
            })?
        };

        let client = build_client(kind, &settings, self.timeout).await?;
        tracing::info!(provider = %kind, "Storage provider client constructed");
        clients.insert(kind, client.clone());
        Ok(client)
    }

    /// Drop the cached client for one kind; the next call reconstructs it
    /// from the current configuration.
    pub async fn invalidate(&self, kind: ProviderKind) {
        let mut clients = self.clients.write().await;
        if clients.remove(&kind).is_some() {
            tracing::info!(provider = %kind, "Storage provider client invalidated");
        }
    }

    /// Replace the active configuration set and drop every cached client,
    /// so configuration changes are observable without a restart.
    pub async fn reload(&self, providers: Vec<ProviderSettings>) {
        {
            let mut configs = self.configs.write().expect("configs lock poisoned");
            *configs = providers.into_iter().map(|p| (p.kind(), p)).collect();
        }
        let mut clients = self.clients.write().await;
        clients.clear();
        tracing::info!("Storage provider configuration reloaded");
    }
}

/// Construct a client for `kind` from `settings`, failing fast when the
/// payload does not match the requested kind.
async fn build_client(
    kind: ProviderKind,
    settings: &ProviderSettings,
    timeout: Duration,
) -> StorageResult<Arc<dyn ProviderClient>> {
    if settings.kind() != kind {
        return Err(StorageError::Config(format!(
            "configuration payload is for '{}' but provider '{}' was requested",
            settings.kind(),
            kind
        )));
    }

    match settings {
        ProviderSettings::Local { root, base_url } => {
            let provider = LocalProvider::new(root.clone(), base_url.clone()).await?;
            Ok(Arc::new(provider))
        }
        ProviderSettings::S3 {
            bucket,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let provider = S3Provider::new(
                bucket.clone(),
                region.clone(),
                endpoint.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
                timeout,
            )?;
            Ok(Arc::new(provider))
        }
        ProviderSettings::GoogleDrive {
            client_id,
            client_secret,
            refresh_token,
            folder_id,
        } => {
            let provider = DriveProvider::new(
                DriveCredentials {
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                },
                folder_id.clone(),
                timeout,
            )?;
            Ok(Arc::new(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn local_settings(dir: &tempfile::TempDir) -> ProviderSettings {
        ProviderSettings::Local {
            root: dir.path().to_path_buf(),
            base_url: "http://localhost:4000/storage/serve/local".to_string(),
        }
    }

    #[tokio::test]
    async fn test_provider_is_cached() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::new(vec![local_settings(&dir)], Duration::from_secs(5));

        let first = manager.provider(ProviderKind::Local).await.unwrap();
        let second = manager.provider(ProviderKind::Local).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_one_instance() {
        let dir = tempdir().unwrap();
        let manager =
            Arc::new(StorageManager::new(vec![local_settings(&dir)], Duration::from_secs(5)));

        let a = manager.clone();
        let b = manager.clone();
        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { a.provider(ProviderKind::Local).await }),
            tokio::spawn(async move { b.provider(ProviderKind::Local).await }),
        );
        let ra = ra.unwrap().unwrap();
        let rb = rb.unwrap().unwrap();
        assert!(Arc::ptr_eq(&ra, &rb));
    }

    #[tokio::test]
    async fn test_unconfigured_kind_is_config_error() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::new(vec![local_settings(&dir)], Duration::from_secs(5));

        let err = manager.provider(ProviderKind::S3).await.err().unwrap();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[tokio::test]
    async fn test_invalidate_rebuilds_client() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::new(vec![local_settings(&dir)], Duration::from_secs(5));

        let first = manager.provider(ProviderKind::Local).await.unwrap();
        manager.invalidate(ProviderKind::Local).await;
        let second = manager.provider(ProviderKind::Local).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_reload_replaces_configuration() {
        let dir = tempdir().unwrap();
        let manager = StorageManager::new(vec![local_settings(&dir)], Duration::from_secs(5));
        let _ = manager.provider(ProviderKind::Local).await.unwrap();

        // Drop local, add nothing: local must now be unconfigured.
        manager.reload(vec![]).await;
        let err = manager.provider(ProviderKind::Local).await.err().unwrap();
        assert!(matches!(err, StorageError::Config(_)));
        assert!(manager.configured_kinds().is_empty());
    }
}
