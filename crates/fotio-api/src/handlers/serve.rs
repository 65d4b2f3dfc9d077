//! Media serving endpoint.
//!
//! `GET /storage/serve/{provider}/{*path}` resolves the provider, answers
//! conditional requests before touching any backend, and otherwise proxies
//! the object's bytes with content typing and cache headers.
//!
//! Error bodies here follow the serving contract (`{error, provider?,
//! path?}`) rather than the generic `ErrorResponse`, so a 404 echoes
//! exactly which provider/key was attempted. Provider failures surface
//! only their classification; messages that could carry backend detail
//! stay in the logs.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use fotio_core::ProviderKind;
use fotio_storage::{keys, ObjectPayload, StorageError};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cache::ContentClass;
use crate::content_type;
use crate::state::AppState;

/// Serving-path error body: the attempted provider and path are echoed for
/// diagnosability, credentials never.
#[derive(Debug, Serialize)]
pub struct ServeError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path((provider, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let Ok(kind) = ProviderKind::from_str(&provider) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            ServeError {
                error: format!("unknown storage provider '{}'", provider),
                provider: Some(provider),
                path: Some(path),
            },
        );
    };

    if let Err(err) = keys::validate_key(&path) {
        return error_response(
            StatusCode::BAD_REQUEST,
            ServeError {
                error: err.to_string(),
                provider: Some(kind.to_string()),
                path: Some(path),
            },
        );
    }

    let class = if keys::is_thumbnail_key(&path) {
        ContentClass::Thumbnail
    } else {
        ContentClass::Image
    };

    // Conditional hit: answer from the client's own validators without
    // touching the provider at all.
    if state.cache.should_serve_304(&headers, class) {
        tracing::debug!(provider = %kind, path = %path, "Conditional request served as 304");
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::CACHE_CONTROL, state.cache.cache_control(class))
            .body(Body::empty())
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }

    let client = match state.storage.provider(kind).await {
        Ok(client) => client,
        Err(err) => return storage_error_response(kind, &path, err),
    };

    let payload = match client.get_buffer(&path).await {
        Ok(payload) => payload,
        Err(err) => return storage_error_response(kind, &path, err),
    };

    media_response(&state, kind, &path, class, payload)
}

fn media_response(
    state: &AppState,
    kind: ProviderKind,
    path: &str,
    class: ContentClass,
    payload: ObjectPayload,
) -> Response {
    let content_type = content_type::for_key(path, payload.info.content_type.as_deref());
    let etag = payload
        .info
        .etag
        .clone()
        .unwrap_or_else(|| hex::encode(Sha256::digest(&payload.bytes)));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, payload.bytes.len())
        .header(header::CACHE_CONTROL, state.cache.cache_control(class))
        .header(header::ETAG, format!("\"{}\"", etag));

    if let Some(modified) = payload.info.last_modified {
        builder = builder.header(header::LAST_MODIFIED, http_date(modified));
    }

    tracing::debug!(
        provider = %kind,
        path = %path,
        size_bytes = payload.bytes.len(),
        "Serving media object"
    );

    builder
        .body(Body::from(payload.bytes))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build media response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

fn storage_error_response(kind: ProviderKind, path: &str, err: StorageError) -> Response {
    match err {
        StorageError::NotFound(_) => {
            tracing::debug!(provider = %kind, path = %path, "Object not found");
            error_response(
                StatusCode::NOT_FOUND,
                ServeError {
                    error: "object not found".to_string(),
                    provider: Some(kind.to_string()),
                    path: Some(path.to_string()),
                },
            )
        }
        StorageError::InvalidKey(msg) => error_response(
            StatusCode::BAD_REQUEST,
            ServeError {
                error: msg,
                provider: Some(kind.to_string()),
                path: Some(path.to_string()),
            },
        ),
        StorageError::Config(msg) => {
            tracing::error!(provider = %kind, error = %msg, "Provider misconfigured");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ServeError {
                    error: "storage provider misconfigured".to_string(),
                    provider: Some(kind.to_string()),
                    path: None,
                },
            )
        }
        StorageError::Provider { class, code, message } => {
            tracing::error!(
                provider = %kind,
                path = %path,
                class = %class,
                code = %code,
                error = %message,
                "Provider error while serving media"
            );
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ServeError {
                    error: format!("storage provider error ({})", class),
                    provider: Some(kind.to_string()),
                    path: Some(path.to_string()),
                },
            )
        }
        StorageError::Io(err) => {
            tracing::error!(provider = %kind, path = %path, error = %err, "IO error while serving media");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ServeError {
                    error: "storage I/O error".to_string(),
                    provider: Some(kind.to_string()),
                    path: Some(path.to_string()),
                },
            )
        }
    }
}

fn error_response(status: StatusCode, body: ServeError) -> Response {
    (status, Json(body)).into_response()
}

/// RFC 7231 IMF-fixdate, as required for Last-Modified.
fn http_date(dt: DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_http_date_format() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap();
        assert_eq!(http_date(dt), "Tue, 03 Feb 2026 10:00:00 GMT");
    }

    #[test]
    fn test_serve_error_omits_absent_fields() {
        let body = ServeError {
            error: "object not found".to_string(),
            provider: Some("local".to_string()),
            path: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("path").is_none());
        assert_eq!(json["provider"], "local");
    }
}
