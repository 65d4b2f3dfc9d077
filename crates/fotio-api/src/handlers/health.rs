//! Health check handlers.
//!
//! `/health` is a liveness probe; `/health/deep` runs a real
//! `validate_connection` round trip against every configured provider and
//! enriches failures with actionable suggestions. The enriched output is
//! admin-facing diagnostics and is marked non-cacheable; it never appears
//! on the public serving path.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use fotio_core::ProviderKind;
use fotio_storage::{ErrorClass, StorageError};
use serde::Serialize;

use crate::cache::ContentClass;
use crate::state::AppState;

#[derive(Serialize)]
pub(crate) struct ProviderHealth {
    pub provider: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct DeepHealthResponse {
    pub status: String,
    pub providers: Vec<ProviderHealth>,
}

/// Liveness probe - process is running.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CACHE_CONTROL,
            state.cache.cache_control(ContentClass::ApiPayload),
        )],
        Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Deep health check - one validation round trip per configured provider.
pub async fn deep_health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    let timeout = state.config.storage_timeout();
    let mut providers = Vec::new();
    let mut overall_healthy = true;

    for kind in state.storage.configured_kinds() {
        let health = check_provider(&state, kind, timeout).await;
        if health.status != "healthy" {
            overall_healthy = false;
        }
        providers.push(health);
    }

    if providers.is_empty() {
        overall_healthy = false;
        tracing::warn!("Deep health check ran with no storage providers configured");
    }

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = DeepHealthResponse {
        status: if overall_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        providers,
    };

    (
        status_code,
        [(
            header::CACHE_CONTROL,
            state.cache.cache_control(ContentClass::Sensitive),
        )],
        Json(body),
    )
}

async fn check_provider(state: &AppState, kind: ProviderKind, timeout: Duration) -> ProviderHealth {
    let validation = tokio::time::timeout(timeout, async {
        let client = state.storage.provider(kind).await?;
        client.validate_connection().await
    })
    .await;

    match validation {
        Ok(Ok(())) => ProviderHealth {
            provider: kind.to_string(),
            status: "healthy".to_string(),
            suggestion: None,
        },
        Ok(Err(err)) => {
            tracing::warn!(provider = %kind, error = %err, "Provider validation failed");
            ProviderHealth {
                provider: kind.to_string(),
                status: format!("unhealthy: {}", err),
                suggestion: Some(suggestion_for(kind, &err).to_string()),
            }
        }
        Err(_) => ProviderHealth {
            provider: kind.to_string(),
            status: "timeout".to_string(),
            suggestion: Some("Check endpoint reachability and network access".to_string()),
        },
    }
}

/// Actionable follow-up for a failed validation, by failure class.
fn suggestion_for(kind: ProviderKind, err: &StorageError) -> &'static str {
    if matches!(err, StorageError::Config(_)) {
        return "Review the provider configuration";
    }
    match (err.class(), kind) {
        (ErrorClass::Auth, ProviderKind::GoogleDrive) => {
            "Token may have expired; re-authorize the Drive connection"
        }
        (ErrorClass::Auth, _) => "Check the configured access credentials",
        (ErrorClass::Network, _) => "Check endpoint reachability and network access",
        (ErrorClass::RateLimited, _) => "Provider is rate limiting; retry later",
        (ErrorClass::Unknown, _) => "Retry; contact support if the failure persists",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_for_drive_auth_failure() {
        let err = StorageError::auth("invalid_grant", "refresh rejected");
        let suggestion = suggestion_for(ProviderKind::GoogleDrive, &err);
        assert!(suggestion.contains("re-authorize"));
    }

    #[test]
    fn test_suggestion_for_config_failure() {
        let err = StorageError::Config("missing bucket".to_string());
        assert_eq!(
            suggestion_for(ProviderKind::S3, &err),
            "Review the provider configuration"
        );
    }
}
