//! Configuration module
//!
//! This module provides configuration structures for the API and storage
//! layer: server settings, cache TTLs, and per-provider storage settings.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::provider::ProviderKind;

// Common constants
const SERVER_PORT: u16 = 4000;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const STORAGE_TIMEOUT_SECS: u64 = 30;

const CACHE_IMAGE_MAX_AGE_SECS: u64 = 31_536_000; // 1 year
const CACHE_THUMBNAIL_MAX_AGE_SECS: u64 = 15_552_000; // 6 months
const CACHE_API_PAYLOAD_MAX_AGE_SECS: u64 = 300;
const CACHE_MEDIA_SWR_SECS: u64 = 86_400; // 1 day
const CACHE_API_PAYLOAD_SWR_SECS: u64 = 60;

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub request_timeout_secs: u64,
    pub storage_timeout_secs: u64,
}

/// Cache TTLs per content class, seconds.
///
/// These feed the static cache-policy table built once at startup; they are
/// env-overridable but immutable after that.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub image_max_age_secs: u64,
    pub image_swr_secs: u64,
    pub thumbnail_max_age_secs: u64,
    pub thumbnail_swr_secs: u64,
    pub api_payload_max_age_secs: u64,
    pub api_payload_swr_secs: u64,
}

/// Per-provider storage settings.
///
/// One active record per provider kind. The kind is derived from the
/// populated variant, so a record can never carry a payload that disagrees
/// with its declared kind.
#[derive(Clone, Debug)]
pub enum ProviderSettings {
    Local {
        /// Root directory for file storage (e.g., "/var/lib/fotio/media")
        root: PathBuf,
        /// Base URL for serving files (e.g., "http://localhost:4000/storage/serve/local")
        base_url: String,
    },
    S3 {
        bucket: String,
        region: String,
        /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    },
    GoogleDrive {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        /// Target folder for uploads; unset means the Drive root.
        folder_id: Option<String>,
    },
}

impl ProviderSettings {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderSettings::Local { .. } => ProviderKind::Local,
            ProviderSettings::S3 { .. } => ProviderKind::S3,
            ProviderSettings::GoogleDrive { .. } => ProviderKind::GoogleDrive,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub cache: CacheConfig,
    pub providers: Vec<ProviderSettings>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            request_timeout_secs: parse_env_u64("REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS),
            storage_timeout_secs: parse_env_u64("STORAGE_TIMEOUT_SECS", STORAGE_TIMEOUT_SECS),
        };

        let cache = CacheConfig {
            image_max_age_secs: parse_env_u64("CACHE_IMAGE_MAX_AGE_SECS", CACHE_IMAGE_MAX_AGE_SECS),
            image_swr_secs: parse_env_u64("CACHE_IMAGE_SWR_SECS", CACHE_MEDIA_SWR_SECS),
            thumbnail_max_age_secs: parse_env_u64(
                "CACHE_THUMBNAIL_MAX_AGE_SECS",
                CACHE_THUMBNAIL_MAX_AGE_SECS,
            ),
            thumbnail_swr_secs: parse_env_u64("CACHE_THUMBNAIL_SWR_SECS", CACHE_MEDIA_SWR_SECS),
            api_payload_max_age_secs: parse_env_u64(
                "CACHE_API_PAYLOAD_MAX_AGE_SECS",
                CACHE_API_PAYLOAD_MAX_AGE_SECS,
            ),
            api_payload_swr_secs: parse_env_u64(
                "CACHE_API_PAYLOAD_SWR_SECS",
                CACHE_API_PAYLOAD_SWR_SECS,
            ),
        };

        let providers = providers_from_env()?;

        Ok(Config {
            base,
            cache,
            providers,
        })
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.base.request_timeout_secs.max(1))
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.base.storage_timeout_secs.max(1))
    }

    pub fn providers(&self) -> &[ProviderSettings] {
        &self.providers
    }

    /// Settings for a specific provider kind, if configured.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    /// Kinds that have an active configuration record.
    pub fn configured_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }
}

fn parse_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Build the provider list from the environment. A provider is active when
/// its identifying variable is set; incomplete cloud configurations fail
/// fast rather than surfacing at first request.
fn providers_from_env() -> Result<Vec<ProviderSettings>, anyhow::Error> {
    let mut providers = Vec::new();

    if let Ok(root) = env::var("LOCAL_STORAGE_PATH") {
        let base_url = env::var("LOCAL_STORAGE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4000/storage/serve/local".to_string());
        providers.push(ProviderSettings::Local {
            root: PathBuf::from(root),
            base_url,
        });
    }

    if let Ok(bucket) = env::var("S3_BUCKET") {
        let region = env::var("S3_REGION")
            .or_else(|_| env::var("AWS_REGION"))
            .map_err(|_| anyhow::anyhow!("S3_REGION or AWS_REGION must be set when S3_BUCKET is configured"))?;
        providers.push(ProviderSettings::S3 {
            bucket,
            region,
            endpoint: env::var("S3_ENDPOINT").ok(),
            access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
        });
    }

    if let Ok(client_id) = env::var("GDRIVE_CLIENT_ID") {
        let client_secret = env::var("GDRIVE_CLIENT_SECRET").map_err(|_| {
            anyhow::anyhow!("GDRIVE_CLIENT_SECRET must be set when GDRIVE_CLIENT_ID is configured")
        })?;
        let refresh_token = env::var("GDRIVE_REFRESH_TOKEN").map_err(|_| {
            anyhow::anyhow!("GDRIVE_REFRESH_TOKEN must be set when GDRIVE_CLIENT_ID is configured")
        })?;
        providers.push(ProviderSettings::GoogleDrive {
            client_id,
            client_secret,
            refresh_token,
            folder_id: env::var("GDRIVE_FOLDER_ID").ok(),
        });
    }

    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(providers: Vec<ProviderSettings>) -> Config {
        Config {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                environment: "test".to_string(),
                request_timeout_secs: 60,
                storage_timeout_secs: 30,
            },
            cache: CacheConfig {
                image_max_age_secs: CACHE_IMAGE_MAX_AGE_SECS,
                image_swr_secs: CACHE_MEDIA_SWR_SECS,
                thumbnail_max_age_secs: CACHE_THUMBNAIL_MAX_AGE_SECS,
                thumbnail_swr_secs: CACHE_MEDIA_SWR_SECS,
                api_payload_max_age_secs: CACHE_API_PAYLOAD_MAX_AGE_SECS,
                api_payload_swr_secs: CACHE_API_PAYLOAD_SWR_SECS,
            },
            providers,
        }
    }

    #[test]
    fn test_provider_lookup_by_kind() {
        let config = test_config(vec![
            ProviderSettings::Local {
                root: PathBuf::from("/tmp/fotio"),
                base_url: "http://localhost:4000/storage/serve/local".to_string(),
            },
            ProviderSettings::S3 {
                bucket: "photos".to_string(),
                region: "us-east-1".to_string(),
                endpoint: None,
                access_key_id: None,
                secret_access_key: None,
            },
        ]);

        assert!(config.provider(ProviderKind::Local).is_some());
        assert!(config.provider(ProviderKind::S3).is_some());
        assert!(config.provider(ProviderKind::GoogleDrive).is_none());
        assert_eq!(
            config.configured_kinds(),
            vec![ProviderKind::Local, ProviderKind::S3]
        );
    }

    #[test]
    fn test_settings_kind_matches_variant() {
        let s3 = ProviderSettings::S3 {
            bucket: "b".to_string(),
            region: "r".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        };
        assert_eq!(s3.kind(), ProviderKind::S3);

        let drive = ProviderSettings::GoogleDrive {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            folder_id: None,
        };
        assert_eq!(drive.kind(), ProviderKind::GoogleDrive);
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config(vec![]);
        assert!(!config.is_production());
        config.base.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
