//! Storage abstraction trait
//!
//! This module defines the ProviderClient trait that all storage backends
//! must implement, and the error taxonomy shared by them.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fotio_core::ProviderKind;
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

/// Classification of a provider failure, used by callers to decide whether
/// to retry, refresh credentials, or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Auth,
    Network,
    RateLimited,
    Unknown,
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ErrorClass::Auth => write!(f, "auth"),
            ErrorClass::Network => write!(f, "network"),
            ErrorClass::RateLimited => write!(f, "rate-limited"),
            ErrorClass::Unknown => write!(f, "unknown"),
        }
    }
}

/// Storage operation errors
///
/// `NotFound` is a distinguished result, not a provider failure: an absent
/// object must never be conflated with an unreachable provider.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider error [{class}/{code}]: {message}")]
    Provider {
        class: ErrorClass,
        /// Provider-specific code (HTTP status, OAuth error string, ...).
        code: String,
        message: String,
    },
}

impl StorageError {
    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Provider {
            class: ErrorClass::Auth,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn network(code: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Provider {
            class: ErrorClass::Network,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(code: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Provider {
            class: ErrorClass::RateLimited,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unknown(code: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Provider {
            class: ErrorClass::Unknown,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Failure classification; non-provider variants fall back to Unknown
    /// (Io counts as Network: the transport failed, not the object).
    pub fn class(&self) -> ErrorClass {
        match self {
            StorageError::Provider { class, .. } => *class,
            StorageError::Io(_) => ErrorClass::Network,
            _ => ErrorClass::Unknown,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata for a stored object, as cheap as the backend can produce it.
#[derive(Debug, Clone, Default)]
pub struct ObjectInfo {
    pub size: u64,
    /// MIME hint from the backend, if it tracks one. The serving layer
    /// prefers extension-based inference and uses this as fallback.
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Backend-supplied entity tag, when available (S3).
    pub etag: Option<String>,
}

/// Full object content plus the metadata the backend returned alongside it,
/// so serving can set validators without a second round trip.
#[derive(Debug, Clone)]
pub struct ObjectPayload {
    pub bytes: Bytes,
    pub info: ObjectInfo,
}

/// Storage abstraction trait
///
/// All storage backends (local filesystem, S3-compatible, Google Drive)
/// implement this trait. Callers work against it without coupling to a
/// specific backend; provider identity never leaks through the contract.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Fetch the raw content for a canonical key.
    ///
    /// An absent object is `StorageError::NotFound`, never a provider
    /// failure.
    async fn get_buffer(&self, key: &str) -> StorageResult<ObjectPayload>;

    /// Cheap existence/metadata check, used to short-circuit before paying
    /// for a full buffer fetch. Absent objects are `NotFound`.
    async fn get_info(&self, key: &str) -> StorageResult<ObjectInfo>;

    /// Write content and return the key callers must persist.
    ///
    /// Cloud backends may mint a new object/file id instead of honoring the
    /// caller-supplied key; the returned key is authoritative.
    async fn put_buffer(&self, key: &str, data: Bytes) -> StorageResult<String>;

    /// Delete an object. Idempotent: deleting an already-absent key
    /// succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Minimal round trip confirming credentials and reachability.
    ///
    /// Used by admin-facing health checks, never by the hot serving path.
    async fn validate_connection(&self) -> StorageResult<()>;

    /// The backend kind this client talks to.
    fn kind(&self) -> ProviderKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_class_accessor() {
        assert_eq!(
            StorageError::auth("401", "bad token").class(),
            ErrorClass::Auth
        );
        assert_eq!(
            StorageError::rate_limited("429", "slow down").class(),
            ErrorClass::RateLimited
        );
        assert_eq!(
            StorageError::NotFound("k".to_string()).class(),
            ErrorClass::Unknown
        );
        let io = StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timed out",
        ));
        assert_eq!(io.class(), ErrorClass::Network);
    }

    #[test]
    fn test_not_found_is_distinguished() {
        let err = StorageError::NotFound("albums/a1/p1.jpg".to_string());
        assert!(err.is_not_found());
        assert!(!StorageError::network("timeout", "connect timed out").is_not_found());
    }

    #[test]
    fn test_provider_error_display_carries_class_and_code() {
        let err = StorageError::auth("invalid_grant", "refresh token rejected");
        let text = err.to_string();
        assert!(text.contains("auth"));
        assert!(text.contains("invalid_grant"));
    }
}
