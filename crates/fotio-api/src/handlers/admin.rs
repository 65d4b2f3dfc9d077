//! Admin storage operations.
//!
//! Configuration changes must be observable without a process restart: the
//! configuration store (or an operator) calls this endpoint after editing a
//! provider's settings, and the next request reconstructs the client from
//! the current configuration.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use fotio_core::{AppError, ProviderKind};

use crate::error::HttpAppError;
use crate::state::AppState;

pub async fn invalidate_provider(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let kind = ProviderKind::from_str(&provider).map_err(|_| {
        AppError::InvalidInput(format!("unknown storage provider '{}'", provider))
    })?;

    state.storage.invalidate(kind).await;
    tracing::info!(provider = %kind, "Provider client invalidated via admin API");

    Ok(Json(serde_json::json!({
        "status": "invalidated",
        "provider": kind.to_string(),
    })))
}
