//! Fotio Storage Library
//!
//! This crate provides the storage abstraction for Fotio: one
//! read/write/serve contract over the local filesystem, S3-compatible
//! object stores, and Google Drive, plus the registry that hands out
//! provider clients and the resolver that picks a servable key for a
//! photo record.
//!
//! # Storage keys
//!
//! A key is the provider-specific identifier that uniquely locates one
//! stored asset: a relative path for the local backend, an object key for
//! S3, a file id for Drive. Keys must not contain `..` or a leading `/`;
//! validation is centralized in the `keys` module so all backends stay
//! consistent.

pub mod drive;
pub mod keys;
pub mod local;
pub mod manager;
pub mod resolver;
pub mod s3;
pub mod token;
pub mod traits;

// Re-export commonly used types
pub use drive::DriveProvider;
pub use fotio_core::ProviderKind;
pub use local::LocalProvider;
pub use manager::StorageManager;
pub use resolver::{resolve, AssetPreference, ResolvedAsset};
pub use s3::S3Provider;
pub use token::{DriveCredentials, TokenCache};
pub use traits::{
    ErrorClass, ObjectInfo, ObjectPayload, ProviderClient, StorageError, StorageResult,
};
