//! HTTP cache policy.
//!
//! Maps a logical content class to caching directives and conditional
//! request handling. The table is built once at startup from configuration
//! and is immutable afterwards; this module is pure and performs no I/O.

use axum::http::{header, HeaderMap};
use fotio_core::config::CacheConfig;

/// Cache-policy category of a response, independent of provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// Immutable full-size originals.
    Image,
    /// Derived thumbnail variants.
    Thumbnail,
    /// JSON API payloads.
    ApiPayload,
    /// Anything that must never be cached (tokens, admin diagnostics).
    Sensitive,
}

/// Directives for one content class.
#[derive(Debug, Clone)]
pub struct CachePolicyEntry {
    pub max_age: u64,
    pub s_maxage: Option<u64>,
    pub stale_while_revalidate: Option<u64>,
    pub public: bool,
    pub immutable: bool,
    pub must_revalidate: bool,
    pub no_store: bool,
}

impl CachePolicyEntry {
    fn no_store() -> Self {
        CachePolicyEntry {
            max_age: 0,
            s_maxage: None,
            stale_while_revalidate: None,
            public: false,
            immutable: false,
            must_revalidate: true,
            no_store: true,
        }
    }

    fn public(max_age: u64, stale_while_revalidate: u64) -> Self {
        CachePolicyEntry {
            max_age,
            s_maxage: None,
            stale_while_revalidate: Some(stale_while_revalidate),
            public: true,
            immutable: false,
            must_revalidate: false,
            no_store: false,
        }
    }
}

/// Static content-class -> directives table.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    image: CachePolicyEntry,
    thumbnail: CachePolicyEntry,
    api_payload: CachePolicyEntry,
    sensitive: CachePolicyEntry,
}

impl CachePolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        let mut image = CachePolicyEntry::public(config.image_max_age_secs, config.image_swr_secs);
        // Originals never change under a given key.
        image.immutable = true;

        CachePolicy {
            image,
            thumbnail: CachePolicyEntry::public(
                config.thumbnail_max_age_secs,
                config.thumbnail_swr_secs,
            ),
            api_payload: CachePolicyEntry::public(
                config.api_payload_max_age_secs,
                config.api_payload_swr_secs,
            ),
            sensitive: CachePolicyEntry::no_store(),
        }
    }

    pub fn entry(&self, class: ContentClass) -> &CachePolicyEntry {
        match class {
            ContentClass::Image => &self.image,
            ContentClass::Thumbnail => &self.thumbnail,
            ContentClass::ApiPayload => &self.api_payload,
            ContentClass::Sensitive => &self.sensitive,
        }
    }

    /// Rendered `Cache-Control` value for a content class.
    pub fn cache_control(&self, class: ContentClass) -> String {
        let entry = self.entry(class);

        if entry.no_store {
            return "no-store, no-cache, private, must-revalidate".to_string();
        }

        let mut parts = vec![
            if entry.public { "public" } else { "private" }.to_string(),
            format!("max-age={}", entry.max_age),
        ];
        if let Some(s_maxage) = entry.s_maxage {
            parts.push(format!("s-maxage={}", s_maxage));
        }
        if let Some(swr) = entry.stale_while_revalidate {
            parts.push(format!("stale-while-revalidate={}", swr));
        }
        if entry.immutable {
            parts.push("immutable".to_string());
        }
        if entry.must_revalidate {
            parts.push("must-revalidate".to_string());
        }
        parts.join(", ")
    }

    /// Whether a conditional request may be answered with an empty 304:
    /// only for cacheable classes, and only when the request actually
    /// carries a validator header.
    pub fn should_serve_304(&self, headers: &HeaderMap, class: ContentClass) -> bool {
        if self.entry(class).no_store {
            return false;
        }
        headers.contains_key(header::IF_NONE_MATCH)
            || headers.contains_key(header::IF_MODIFIED_SINCE)
    }
}
