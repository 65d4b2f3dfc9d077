//! Fotio API Library
//!
//! This crate provides the HTTP media-serving surface, cache policy,
//! middleware, and application setup.

// Module declarations
mod content_type;
mod handlers;
mod middleware;
mod telemetry;

// Public modules
pub mod cache;
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use cache::{CachePolicy, ContentClass};
pub use error::ErrorResponse;
pub use state::AppState;
