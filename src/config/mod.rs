//! Configuration for routeload
//!
//! Settings live in a TOML file, all fields optional:
//!
//! ```toml
//! base_url = "http://localhost:3000/stores"
//! concurrent = false
//! verbose = false
//! cache_ttl_ms = 1000
//! timeout_secs = 30
//!
//! [headers]
//! authorization = "Bearer ..."
//! ```
//!
//! # Location
//!
//! The first match wins:
//!
//! 1. An explicit path (`routeload --config PATH`)
//! 2. The `ROUTELOAD_CONFIG` environment variable
//! 3. `~/.routeload/config.toml` (`%LOCALAPPDATA%\routeload\config.toml` on Windows)
//!
//! A missing file yields the defaults. Command-line flags override file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    CONFIG_DIR, CONFIG_ENV, CONFIG_FILE, DEFAULT_CACHE_TTL_MS, DEFAULT_TIMEOUT_SECS,
};
use crate::core::LoaderError;
use crate::fetch::{CachingFetcher, ReqwestTransport, RequestCache};
use crate::resolver::ResolveOptions;

const fn default_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Loader settings read from `config.toml`.
///
/// # Examples
///
/// ```rust
/// use routeload::config::LoaderConfig;
///
/// let config: LoaderConfig = toml::from_str(r#"
///     base_url = "http://localhost:3000/stores/"
///     concurrent = true
/// "#).unwrap();
///
/// let config = config.validate().unwrap();
/// assert_eq!(config.base_url, "http://localhost:3000/stores");
/// assert!(config.resolve_options().concurrent);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Prefix of every store URL.
    #[serde(default)]
    pub base_url: String,

    /// Fetch every eligible store of a pass at once.
    #[serde(default)]
    pub concurrent: bool,

    /// Log each fetch at `info` level.
    #[serde(default)]
    pub verbose: bool,

    /// Lifetime of a cached response in milliseconds. Must be positive.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Headers sent with every store request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            concurrent: false,
            verbose: false,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::new(),
        }
    }
}

impl LoaderConfig {
    /// Load from `ROUTELOAD_CONFIG` or the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` when given, otherwise as [`load`](Self::load) does.
    ///
    /// An explicit path must exist; the implicit locations may be absent.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(&path).await;
        }
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load and validate the file at `path`.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        Ok(config.validate()?)
    }

    /// Default location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error when the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("routeload")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(CONFIG_DIR)
        };

        Ok(config_dir.join(CONFIG_FILE))
    }

    /// Normalize and check the settings.
    ///
    /// Strips trailing slashes from `base_url`; rejects a zero cache TTL or
    /// timeout and header names that are empty.
    pub fn validate(mut self) -> Result<Self, LoaderError> {
        self.base_url = self.base_url.trim_end_matches('/').to_string();

        if self.cache_ttl_ms == 0 {
            return Err(LoaderError::ConfigError {
                message: "cache_ttl_ms must be greater than 0".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(LoaderError::ConfigError {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }
        if let Some(name) = self.headers.keys().find(|name| name.trim().is_empty()) {
            return Err(LoaderError::ConfigError {
                message: format!("header name '{name}' is empty"),
            });
        }
        Ok(self)
    }

    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolver options matching these settings.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::new(self.base_url.clone())
            .concurrent(self.concurrent)
            .verbose(self.verbose)
    }

    /// HTTP fetcher with its own request cache, using the configured timeout,
    /// TTL and headers.
    pub fn build_fetcher(&self) -> Result<CachingFetcher<ReqwestTransport>> {
        let transport = ReqwestTransport::with_timeout(self.timeout())?;
        let cache = Arc::new(RequestCache::new(transport, self.cache_ttl()));
        Ok(CachingFetcher::new(cache).with_headers(self.headers.clone()))
    }
}
