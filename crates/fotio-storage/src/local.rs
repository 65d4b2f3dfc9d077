use crate::keys;
use crate::traits::{ObjectInfo, ObjectPayload, ProviderClient, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fotio_core::ProviderKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalProvider {
    base_path: PathBuf,
    base_url: String,
}

impl LocalProvider {
    /// Create a new LocalProvider instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/fotio/media")
    /// * `base_url` - Base URL under which these files are served
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::Config(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalProvider {
            base_path,
            base_url,
        })
    }

    /// Convert a storage key to a filesystem path with security validation.
    ///
    /// Keys with traversal sequences are rejected before joining; if the
    /// joined path already exists it must canonicalize inside the base
    /// directory (catches symlink escapes).
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        keys::validate_key(key)?;

        let path = self.base_path.join(key);

        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::Config(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Public URL for a key under this provider's base URL.
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn stat(&self, key: &str, path: &Path) -> StorageResult<ObjectInfo> {
        let meta = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        if !meta.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let last_modified = meta
            .modified()
            .ok()
            .map(|mtime| DateTime::<Utc>::from(mtime));

        Ok(ObjectInfo {
            size: meta.len(),
            content_type: None,
            last_modified,
            etag: None,
        })
    }
}

#[async_trait]
impl ProviderClient for LocalProvider {
    async fn get_buffer(&self, key: &str) -> StorageResult<ObjectPayload> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let info = self.stat(key, &path).await?;

        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        tracing::debug!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(ObjectPayload {
            bytes: Bytes::from(data),
            info,
        })
    }

    async fn get_info(&self, key: &str) -> StorageResult<ObjectInfo> {
        let path = self.key_to_path(key)?;
        self.stat(key, &path).await
    }

    async fn put_buffer(&self, key: &str, data: Bytes) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::unknown(
                "create",
                format!("Failed to create file {}: {}", path.display(), e),
            )
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::unknown(
                "write",
                format!("Failed to write file {}: {}", path.display(), e),
            )
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::unknown(
                "sync",
                format!("Failed to sync file {}: {}", path.display(), e),
            )
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        // Local keys are stable; the caller-supplied key is the canonical one.
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::unknown(
                "delete",
                format!("Failed to delete file {}: {}", path.display(), e),
            )
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn validate_connection(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await.map_err(|e| {
            StorageError::Config(format!(
                "Storage directory {} is not accessible: {}",
                self.base_path.display(),
                e
            ))
        })?;

        if !meta.is_dir() {
            return Err(StorageError::Config(format!(
                "Storage path {} is not a directory",
                self.base_path.display()
            )));
        }

        // One real round trip: listing the root confirms read permission.
        fs::read_dir(&self.base_path)
            .await
            .map_err(StorageError::Io)?;

        Ok(())
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }
}
