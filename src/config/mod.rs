//! Configuration module for the release notes backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// GitHub access and webhook settings.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Base URL of the GitHub REST API
    pub api_url: String,
    pub org: String,
    pub repo: String,
    /// Optional token; unauthenticated calls are heavily rate limited
    pub token: Option<String>,
    pub webhook_secret: String,
    /// Header carrying the signature (SHA-1) or the secret (PLAIN_TEXT)
    pub secret_header: String,
    /// One of SHA-1, URL_APPEND, PLAIN_TEXT
    pub secret_validator: String,
    pub event_type_header: String,
    /// Prefix used to build each release's tag link
    pub tag_link_base: String,
}

/// Where the latest-tag marker lives.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobStorageKind {
    /// A directory on local disk
    Local { dir: PathBuf },
    /// An S3-compatible bucket
    S3(S3Config),
}

#[derive(Debug, Clone, PartialEq)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO etc.)
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

/// Blob storage settings. When enabled, releases are kept in the in-process
/// cache and the database is never opened.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub enabled: bool,
    pub kind: BlobStorageKind,
}

/// Presentation fields of the `cicd` module in the module catalog.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    pub base_min_version_supported: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub info: String,
    pub assets: Vec<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    pub github: GithubConfig,
    pub blob: BlobConfig,
    pub module: ModuleConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let bind_addr = var_or("RN_BIND_ADDR", "127.0.0.1:8080")
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid RN_BIND_ADDR format: {}", e)))?;

        let log_level = var_or("RN_LOG_LEVEL", "info");
        let db_path = var_or("RN_DB_PATH", "./data/release_notes.sqlite").into();

        let github = GithubConfig {
            api_url: var_or("RN_GITHUB_API_URL", "https://api.github.com"),
            org: var_or("RN_GITHUB_ORG", "devtron-labs"),
            repo: var_or("RN_GITHUB_REPO", "devtron"),
            token: env::var("RN_GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            webhook_secret: var_or("RN_GITHUB_WEBHOOK_SECRET", ""),
            secret_header: var_or("RN_GITHUB_SECRET_HEADER", "X-Hub-Signature"),
            secret_validator: var_or("RN_GITHUB_SECRET_VALIDATOR", "SHA-1"),
            event_type_header: var_or("RN_GITHUB_EVENT_TYPE_HEADER", "X-GitHub-Event"),
            tag_link_base: var_or(
                "RN_RELEASE_TAG_LINK",
                "https://github.com/devtron-labs/devtron/releases/tag",
            ),
        };

        let blob = BlobConfig {
            enabled: parse_bool("RN_BLOB_ENABLED", false)?,
            kind: blob_kind_from_env()?,
        };

        let module = ModuleConfig {
            base_min_version_supported: var_or("RN_MODULE_BASE_MIN_VERSION", "v0.0.1"),
            title: var_or("RN_MODULE_TITLE", "Build and Deploy (CI/CD)"),
            description: var_or(
                "RN_MODULE_DESCRIPTION",
                "Enables continuous code integration and deployment.",
            ),
            icon: var_or(
                "RN_MODULE_ICON",
                "https://cdn.devtron.ai/images/ic-integration-cicd.png",
            ),
            info: var_or(
                "RN_MODULE_INFO",
                "Continuous integration and deployment pipelines",
            ),
            assets: env::var("RN_MODULE_ASSETS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        };

        Ok(Self {
            bind_addr,
            log_level,
            db_path,
            github,
            blob,
            module,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, default: bool) -> Result<bool, AppError> {
    match env::var(key) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(AppError::Internal(format!(
                "Invalid {} value: {}",
                key, other
            ))),
        },
        Err(_) => Ok(default),
    }
}

fn blob_kind_from_env() -> Result<BlobStorageKind, AppError> {
    let kind = var_or("RN_BLOB_STORAGE_TYPE", "LOCAL");
    match kind.to_ascii_uppercase().as_str() {
        "LOCAL" => Ok(BlobStorageKind::Local {
            dir: var_or("RN_BLOB_LOCAL_DIR", "./data/blob").into(),
        }),
        "S3" => Ok(BlobStorageKind::S3(S3Config {
            bucket: var_or("RN_BLOB_S3_BUCKET", ""),
            region: var_or("RN_BLOB_S3_REGION", "us-east-1"),
            endpoint: env::var("RN_BLOB_S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
            access_key: env::var("RN_BLOB_S3_ACCESS_KEY").ok(),
            secret_key: env::var("RN_BLOB_S3_SECRET_KEY").ok(),
        })),
        other => Err(AppError::Internal(format!(
            "Unsupported RN_BLOB_STORAGE_TYPE: {}",
            other
        ))),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // All env mutation for this module lives in this one test.
    #[test]
    fn test_config_from_env() {
        for key in [
            "RN_BIND_ADDR",
            "RN_LOG_LEVEL",
            "RN_DB_PATH",
            "RN_GITHUB_ORG",
            "RN_GITHUB_TOKEN",
            "RN_GITHUB_SECRET_VALIDATOR",
            "RN_BLOB_ENABLED",
            "RN_BLOB_STORAGE_TYPE",
            "RN_BLOB_LOCAL_DIR",
            "RN_MODULE_ASSETS",
        ] {
            env::remove_var(key);
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.db_path, PathBuf::from("./data/release_notes.sqlite"));
        assert_eq!(config.github.org, "devtron-labs");
        assert!(config.github.token.is_none());
        assert_eq!(config.github.secret_validator, "SHA-1");
        assert!(!config.blob.enabled);
        assert_eq!(
            config.blob.kind,
            BlobStorageKind::Local {
                dir: PathBuf::from("./data/blob")
            }
        );
        assert!(config.module.assets.is_empty());

        env::set_var("RN_BLOB_ENABLED", "true");
        env::set_var("RN_BLOB_STORAGE_TYPE", "s3");
        env::set_var("RN_MODULE_ASSETS", "a.png, b.png,,");
        let config = Config::from_env().unwrap();
        assert!(config.blob.enabled);
        assert!(matches!(config.blob.kind, BlobStorageKind::S3(_)));
        assert_eq!(config.module.assets, vec!["a.png", "b.png"]);

        env::set_var("RN_BLOB_ENABLED", "maybe");
        assert!(Config::from_env().is_err());

        env::remove_var("RN_BLOB_ENABLED");
        env::remove_var("RN_BLOB_STORAGE_TYPE");
        env::remove_var("RN_MODULE_ASSETS");
    }
}
