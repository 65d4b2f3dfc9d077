use crate::keys;
use crate::traits::{ObjectInfo, ObjectPayload, ProviderClient, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use fotio_core::ProviderKind;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::ClientOptions;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::time::Duration;

/// Sentinel key used by connection validation; expected to be absent.
const CONNECTION_PROBE_KEY: &str = "fotio-connection-probe";

/// S3-compatible object store implementation
#[derive(Clone)]
pub struct S3Provider {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Provider {
    /// Create a new S3Provider instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "https://nyc3.digitaloceanspaces.com" for DigitalOcean Spaces)
    /// * `access_key_id` / `secret_access_key` - Explicit credentials; when
    ///   absent the ambient environment/instance credentials are used.
    /// * `timeout` - Bound on each request (connect + read).
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let client_options = ClientOptions::new()
            .with_timeout(timeout)
            .with_connect_timeout(timeout);

        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone())
            .with_client_options(client_options);

        if let Some(key_id) = access_key_id {
            builder = builder.with_access_key_id(key_id);
        }
        if let Some(secret) = secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(S3Provider {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Public URL for an object.
    ///
    /// For AWS S3, the standard virtual-hosted format; for S3-compatible
    /// providers, path-style under the configured endpoint.
    pub fn url_for(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    /// Map object_store failures onto the storage error taxonomy.
    fn classify(key: &str, err: ObjectStoreError) -> StorageError {
        match err {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            ObjectStoreError::Unauthenticated { .. } => {
                StorageError::auth("unauthenticated", err.to_string())
            }
            ObjectStoreError::PermissionDenied { .. } => {
                StorageError::auth("permission-denied", err.to_string())
            }
            // Transport-level failures (timeouts, connection resets) surface
            // from the HTTP client as Generic errors.
            ObjectStoreError::Generic { .. } => StorageError::network("generic", err.to_string()),
            other => StorageError::unknown("object-store", other.to_string()),
        }
    }

    fn info_from_meta(meta: &object_store::ObjectMeta) -> ObjectInfo {
        ObjectInfo {
            size: meta.size,
            content_type: None,
            last_modified: Some(meta.last_modified),
            etag: meta.e_tag.clone(),
        }
    }
}

#[async_trait]
impl ProviderClient for S3Provider {
    async fn get_buffer(&self, key: &str) -> StorageResult<ObjectPayload> {
        keys::validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;
        let result = result.map_err(|e| {
            let mapped = Self::classify(key, e);
            if !mapped.is_not_found() {
                tracing::error!(
                    error = %mapped,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 get failed"
                );
            }
            mapped
        })?;

        let info = Self::info_from_meta(&result.meta);
        let bytes = result
            .bytes()
            .await
            .map_err(|e| Self::classify(key, e))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 get successful"
        );

        Ok(ObjectPayload { bytes, info })
    }

    async fn get_info(&self, key: &str) -> StorageResult<ObjectInfo> {
        keys::validate_key(key)?;
        let location = Path::from(key.to_string());

        let meta = self
            .store
            .head(&location)
            .await
            .map_err(|e| Self::classify(key, e))?;

        Ok(Self::info_from_meta(&meta))
    }

    async fn put_buffer(&self, key: &str, data: Bytes) -> StorageResult<String> {
        keys::validate_key(key)?;
        let size = data.len() as u64;
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(data)).await;

        result.map_err(|e| {
            let mapped = Self::classify(key, e);
            tracing::error!(
                error = %mapped,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 put failed"
            );
            mapped
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        // Object keys are caller-controlled on S3; no new id is minted.
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        keys::validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        match self.store.delete(&location).await {
            Ok(()) => {}
            // Idempotent: the object being gone is the desired state.
            Err(ObjectStoreError::NotFound { .. }) => return Ok(()),
            Err(e) => {
                let mapped = Self::classify(key, e);
                tracing::error!(
                    error = %mapped,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(mapped);
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn validate_connection(&self) -> StorageResult<()> {
        // A HEAD on a key that should not exist exercises auth and
        // reachability; NotFound is the healthy answer.
        let location = Path::from(CONNECTION_PROBE_KEY.to_string());
        match self.store.head(&location).await {
            Ok(_) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(Self::classify(CONNECTION_PROBE_KEY, e)),
        }
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::S3
    }
}
