//! Constants shared by the configuration layer and the CLI.

use std::time::Duration;

/// Default time a cached response stays valid (1 second).
///
/// Long enough for the stores of one view to share responses, short enough
/// that navigating back picks up fresh data.
pub const DEFAULT_CACHE_TTL_MS: u64 = 1000;

/// Default HTTP request timeout (30 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable pointing at an alternative configuration file.
pub const CONFIG_ENV: &str = "ROUTELOAD_CONFIG";

/// Directory below the home directory holding the default configuration.
pub const CONFIG_DIR: &str = ".routeload";

pub const CONFIG_FILE: &str = "config.toml";

/// Default cache TTL as a [`Duration`].
pub const fn default_cache_ttl() -> Duration {
    Duration::from_millis(DEFAULT_CACHE_TTL_MS)
}
