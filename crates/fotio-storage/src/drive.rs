//! Google Drive storage backend.
//!
//! Keys are Drive file ids. Every call goes through the Drive v3 REST API
//! with a bearer token from the provider's [`TokenCache`]; uploads mint a
//! new file id which callers must persist. Drive-generated thumbnails are
//! unreliable (they can 404 while the full asset is fine), which is why the
//! asset resolver prefers full images when a thumbnail key looks
//! path-derived - this backend just reports honestly what exists.

use crate::keys;
use crate::token::{DriveCredentials, TokenCache};
use crate::traits::{ObjectInfo, ObjectPayload, ProviderClient, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use fotio_core::ProviderKind;
use serde::Deserialize;
use std::time::Duration;

const DRIVE_API_BASE: &str = "https://www.googleapis.com";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com";
const MULTIPART_BOUNDARY: &str = "fotio_drive_upload";

/// Metadata subset requested on info calls.
const FILE_FIELDS: &str = "id,name,size,mimeType,modifiedTime";

#[derive(Deserialize)]
struct DriveFileMeta {
    #[serde(default)]
    size: Option<String>,
    #[serde(default, rename = "mimeType")]
    mime_type: Option<String>,
    #[serde(default, rename = "modifiedTime")]
    modified_time: Option<String>,
}

#[derive(Deserialize)]
struct DriveFileId {
    id: String,
}

/// Google Drive storage implementation
pub struct DriveProvider {
    http: reqwest::Client,
    tokens: TokenCache,
    folder_id: Option<String>,
    api_base: String,
    upload_base: String,
}

impl DriveProvider {
    /// Create a new DriveProvider instance.
    ///
    /// # Arguments
    /// * `credentials` - OAuth client credentials and refresh token
    /// * `folder_id` - Target folder for uploads; unset means the Drive root
    /// * `timeout` - Bound on each request (connect + read)
    pub fn new(
        credentials: DriveCredentials,
        folder_id: Option<String>,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let tokens = TokenCache::new(http.clone(), credentials);

        Ok(DriveProvider {
            http,
            tokens,
            folder_id,
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
        })
    }

    /// Redirect all endpoints at a test double. Test seam.
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.upload_base = upload_base.into();
        self.tokens = self.tokens.with_token_url(token_url);
        self
    }

    /// The token cache, for the administrative authorization-code exchange.
    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> StorageResult<reqwest::Response> {
        let bearer = self.tokens.bearer().await?;
        let response = request
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(transport_error)?;

        // A 401 on a token that looked fresh means it was revoked server
        // side; drop it so the next call refreshes.
        if response.status().as_u16() == 401 {
            self.tokens.invalidate().await;
        }

        Ok(response)
    }

    async fn status_error(key: &str, response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(200).collect();

        match status {
            404 => StorageError::NotFound(key.to_string()),
            401 => StorageError::auth("401", "Drive rejected the access token"),
            403 if excerpt.to_lowercase().contains("ratelimit") => {
                StorageError::rate_limited("403", excerpt)
            }
            403 => StorageError::auth("403", excerpt),
            429 => StorageError::rate_limited("429", excerpt),
            _ => StorageError::unknown(status.to_string(), excerpt),
        }
    }
}

#[async_trait]
impl ProviderClient for DriveProvider {
    async fn get_buffer(&self, key: &str) -> StorageResult<ObjectPayload> {
        keys::validate_key(key)?;
        let start = std::time::Instant::now();

        let url = format!("{}/drive/v3/files/{}", self.api_base, key);
        let response = self
            .authorized(self.http.get(&url).query(&[("alt", "media")]))
            .await?;

        if !response.status().is_success() {
            let err = Self::status_error(key, response).await;
            if !err.is_not_found() {
                tracing::error!(
                    error = %err,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Drive download failed"
                );
            }
            return Err(err);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string());

        let bytes = response.bytes().await.map_err(transport_error)?;

        tracing::debug!(
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive download successful"
        );

        let info = ObjectInfo {
            size: bytes.len() as u64,
            content_type,
            last_modified: None,
            etag,
        };

        Ok(ObjectPayload { bytes, info })
    }

    async fn get_info(&self, key: &str) -> StorageResult<ObjectInfo> {
        keys::validate_key(key)?;

        let url = format!("{}/drive/v3/files/{}", self.api_base, key);
        let response = self
            .authorized(self.http.get(&url).query(&[("fields", FILE_FIELDS)]))
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error(key, response).await);
        }

        let meta: DriveFileMeta = response.json().await.map_err(transport_error)?;

        // Drive serializes sizes as strings; folders and Docs-native files
        // have none at all.
        let size = meta
            .size
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let last_modified = meta
            .modified_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.to_utc());

        Ok(ObjectInfo {
            size,
            content_type: meta.mime_type,
            last_modified,
            etag: None,
        })
    }

    async fn put_buffer(&self, key: &str, data: Bytes) -> StorageResult<String> {
        keys::validate_key(key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        // Drive ignores caller keys and mints a file id; the requested key
        // becomes the display name.
        let name = key.rsplit('/').next().unwrap_or(key);
        let mut metadata = serde_json::json!({ "name": name });
        if let Some(ref folder) = self.folder_id {
            metadata["parents"] = serde_json::json!([folder]);
        }

        let mut body = Vec::with_capacity(size + 512);
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!("--{MULTIPART_BOUNDARY}\r\nContent-Type: application/octet-stream\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(&data);
        body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--").as_bytes());

        let url = format!("{}/upload/drive/v3/files", self.upload_base);
        let response = self
            .authorized(
                self.http
                    .post(&url)
                    .query(&[("uploadType", "multipart"), ("fields", "id")])
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
                    )
                    .body(body),
            )
            .await?;

        if !response.status().is_success() {
            let err = Self::status_error(key, response).await;
            tracing::error!(
                error = %err,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Drive upload failed"
            );
            return Err(err);
        }

        let created: DriveFileId = response.json().await.map_err(transport_error)?;

        tracing::info!(
            key = %key,
            file_id = %created.id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive upload successful"
        );

        Ok(created.id)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        keys::validate_key(key)?;
        let start = std::time::Instant::now();

        let url = format!("{}/drive/v3/files/{}", self.api_base, key);
        let response = self.authorized(self.http.delete(&url)).await?;

        let status = response.status();
        // Idempotent: an already-deleted file id is the desired state.
        if !status.is_success() && status.as_u16() != 404 {
            let err = Self::status_error(key, response).await;
            tracing::error!(
                error = %err,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Drive delete failed"
            );
            return Err(err);
        }

        tracing::info!(
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive delete successful"
        );

        Ok(())
    }

    async fn validate_connection(&self) -> StorageResult<()> {
        let url = format!("{}/drive/v3/about", self.api_base);
        let response = self
            .authorized(self.http.get(&url).query(&[("fields", "user")]))
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error("about", response).await);
        }

        Ok(())
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::GoogleDrive
    }
}

fn transport_error(err: reqwest::Error) -> StorageError {
    let code = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else {
        "transport"
    };
    StorageError::network(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path as AxumPath, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{delete as axum_delete, get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::Arc;

    const TEST_BEARER: &str = "Bearer test-token";

    #[derive(Clone, Default)]
    struct MockDrive {
        files: Arc<HashMap<String, (&'static str, &'static [u8])>>,
    }

    async fn token_ok() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "access_token": "test-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        }))
    }

    async fn file_handler(
        State(state): State<MockDrive>,
        AxumPath(id): AxumPath<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> axum::response::Response {
        if headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            != Some(TEST_BEARER)
        {
            return StatusCode::UNAUTHORIZED.into_response();
        }

        let Some((mime, bytes)) = state.files.get(&id) else {
            return StatusCode::NOT_FOUND.into_response();
        };

        if params.get("alt").map(String::as_str) == Some("media") {
            ([("content-type", *mime)], bytes.to_vec()).into_response()
        } else {
            Json(serde_json::json!({
                "id": id,
                "name": "p1.jpg",
                "size": bytes.len().to_string(),
                "mimeType": mime,
                "modifiedTime": "2026-02-03T10:00:00Z"
            }))
            .into_response()
        }
    }

    async fn delete_handler(
        State(state): State<MockDrive>,
        AxumPath(id): AxumPath<String>,
    ) -> StatusCode {
        if state.files.contains_key(&id) {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::NOT_FOUND
        }
    }

    async fn upload_handler() -> Json<serde_json::Value> {
        Json(serde_json::json!({ "id": "minted-file-id" }))
    }

    async fn about_handler(headers: HeaderMap) -> axum::response::Response {
        if headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            != Some(TEST_BEARER)
        {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(serde_json::json!({"user": {"displayName": "Fotio"}})).into_response()
    }

    async fn spawn_mock_drive() -> String {
        let mut files = HashMap::new();
        files.insert(
            "file-1".to_string(),
            ("image/jpeg", b"jpeg bytes".as_slice()),
        );
        let state = MockDrive {
            files: Arc::new(files),
        };

        let app = Router::new()
            .route("/token", post(token_ok))
            .route("/drive/v3/files/{id}", get(file_handler))
            .route("/drive/v3/files/{id}", axum_delete(delete_handler))
            .route("/upload/drive/v3/files", post(upload_handler))
            .route("/drive/v3/about", get(about_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn test_provider(base: &str) -> DriveProvider {
        DriveProvider::new(
            DriveCredentials {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                refresh_token: "refresh".to_string(),
            },
            Some("folder-1".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_urls(base, base, format!("{}/token", base))
    }

    #[tokio::test]
    async fn test_get_buffer_fetches_content() {
        let base = spawn_mock_drive().await;
        let provider = test_provider(&base);

        let payload = provider.get_buffer("file-1").await.unwrap();
        assert_eq!(payload.bytes.as_ref(), b"jpeg bytes");
        assert_eq!(payload.info.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_get_buffer_missing_is_not_found() {
        let base = spawn_mock_drive().await;
        let provider = test_provider(&base);

        let err = provider.get_buffer("file-gone").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_info_parses_drive_metadata() {
        let base = spawn_mock_drive().await;
        let provider = test_provider(&base);

        let info = provider.get_info("file-1").await.unwrap();
        assert_eq!(info.size, 10);
        assert_eq!(info.content_type.as_deref(), Some("image/jpeg"));
        assert!(info.last_modified.is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_ok() {
        let base = spawn_mock_drive().await;
        let provider = test_provider(&base);

        provider.delete("file-1").await.unwrap();
        provider.delete("file-gone").await.unwrap();
    }

    #[tokio::test]
    async fn test_put_buffer_returns_minted_id() {
        let base = spawn_mock_drive().await;
        let provider = test_provider(&base);

        let key = provider
            .put_buffer("albums/a1/p1.jpg", Bytes::from_static(b"data"))
            .await
            .unwrap();
        // Callers must persist the returned id, not the requested key.
        assert_eq!(key, "minted-file-id");
    }

    #[tokio::test]
    async fn test_validate_connection() {
        let base = spawn_mock_drive().await;
        let provider = test_provider(&base);
        provider.validate_connection().await.unwrap();
    }
}
