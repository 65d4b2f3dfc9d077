//! OAuth token lifecycle for the Google Drive provider.
//!
//! The cached access token moves through `Absent -> Valid -> Expired ->
//! Valid (refreshed)`. Every Drive call asks [`TokenCache::bearer`] for a
//! token; an absent or expiring token triggers one refresh-token exchange.
//! The cache's mutex is held across the exchange, so concurrent callers
//! that observe an expired token await the in-flight refresh instead of
//! issuing duplicates (single-flight).

use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::traits::{StorageError, StorageResult};

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this margin count as expired, so a token never
/// dies mid-request.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth client credentials plus the long-lived refresh token.
#[derive(Clone, Debug)]
pub struct DriveCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct AccessToken {
    secret: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now() + EXPIRY_MARGIN
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[allow(dead_code)]
    token_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Per-provider-instance access-token cache with single-flight refresh.
pub struct TokenCache {
    http: reqwest::Client,
    credentials: DriveCredentials,
    token_url: String,
    cached: tokio::sync::Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(http: reqwest::Client, credentials: DriveCredentials) -> Self {
        TokenCache {
            http,
            credentials,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            cached: tokio::sync::Mutex::new(None),
        }
    }

    /// Point the cache at a different token endpoint. Test seam.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// A bearer token that is valid for at least the expiry margin.
    ///
    /// Holding the cache lock across the exchange is what makes the refresh
    /// single-flight; a failed refresh leaves the cached token unchanged.
    pub async fn bearer(&self) -> StorageResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.secret.clone());
            }
        }

        let refreshed = self.refresh().await?;
        let secret = refreshed.secret.clone();
        *cached = Some(refreshed);
        Ok(secret)
    }

    /// Drop the cached token so the next call refreshes. Called when the
    /// provider sees a 401 despite a token that looked fresh.
    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        *cached = None;
    }

    async fn refresh(&self) -> StorageResult<AccessToken> {
        let params = [
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "OAuth token refresh rejected"
            );
            return Err(exchange_error(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::auth("token-decode", e.to_string()))?;

        tracing::debug!(
            expires_in = token.expires_in,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "OAuth token refreshed"
        );

        Ok(AccessToken {
            secret: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    /// One-time administrative exchange of an authorization code for a
    /// refresh token. Driven by the out-of-band OAuth redirect flow, never
    /// by the serving path.
    pub async fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> StorageResult<String> {
        let params = [
            ("code", code),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(exchange_error(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::auth("token-decode", e.to_string()))?;

        token.refresh_token.ok_or_else(|| {
            StorageError::auth(
                "no-refresh-token",
                "authorization code exchange returned no refresh token; \
                 re-authorize with access_type=offline",
            )
        })
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

fn exchange_error(status: reqwest::StatusCode, body: &str) -> StorageError {
    if status.as_u16() == 429 {
        StorageError::rate_limited(status.as_u16().to_string(), "token endpoint rate limited")
    } else {
        // Body is the OAuth error document ({"error": "invalid_grant"}),
        // never our own credentials.
        StorageError::auth(
            status.as_u16().to_string(),
            format!("token exchange failed: {}", body.chars().take(200).collect::<String>()),
        )
    }
}
