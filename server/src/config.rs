//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{bail, Context, Result};
use std::env;

/// Which backing store holds settings and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => bail!("STORE_BACKEND must be \"redis\" or \"memory\", got {other:?}"),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Redis connection URL
    pub redis_url: String,

    /// Settings and session store (default: redis)
    pub store_backend: StoreBackend,

    /// Key prefix of per-community settings hashes
    pub settings_key_prefix: String,

    /// Key prefix of action sessions
    pub session_key_prefix: String,

    /// Action session lifetime in seconds (default: 600 = 10 min)
    pub session_ttl_secs: i64,

    /// Reddit OAuth API base URL
    pub reddit_api_base: String,

    /// OAuth bearer token of the app account
    pub reddit_access_token: String,

    /// User-Agent sent to Reddit
    pub reddit_user_agent: String,

    /// Username of the app account, checked for moderator capability
    pub app_username: String,

    /// Per-request timeout for Reddit calls in seconds (default: 10)
    pub backend_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into()),
            store_backend: env::var("STORE_BACKEND")
                .map_or(Ok(StoreBackend::Redis), |v| StoreBackend::parse(&v))?,
            settings_key_prefix: env::var("SETTINGS_KEY_PREFIX")
                .unwrap_or_else(|_| "banhammer:settings".into()),
            session_key_prefix: env::var("SESSION_KEY_PREFIX")
                .unwrap_or_else(|_| "banhammer:session".into()),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
            reddit_api_base: env::var("REDDIT_API_BASE")
                .unwrap_or_else(|_| "https://oauth.reddit.com".into()),
            reddit_access_token: env::var("REDDIT_ACCESS_TOKEN")
                .context("REDDIT_ACCESS_TOKEN must be set")?,
            reddit_user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| format!("banhammer/{}", env!("CARGO_PKG_VERSION"))),
            app_username: env::var("APP_USERNAME").context("APP_USERNAME must be set")?,
            backend_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }

    /// Create a default configuration for testing.
    ///
    /// Uses the in-memory store; no Redis or Reddit access is needed.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            redis_url: "redis://localhost:6380".into(),
            store_backend: StoreBackend::Memory,
            settings_key_prefix: "test:settings".into(),
            session_key_prefix: "test:session".into(),
            session_ttl_secs: 600,
            reddit_api_base: "http://127.0.0.1:9".into(),
            reddit_access_token: "test-token".into(),
            reddit_user_agent: "banhammer-test".into(),
            app_username: "banhammer-app".into(),
            backend_timeout_secs: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "REDDIT_ACCESS_TOKEN",
        "APP_USERNAME",
        "STORE_BACKEND",
        "SESSION_TTL_SECS",
        "BIND_ADDRESS",
    ];

    fn clear() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear();
        env::set_var("REDDIT_ACCESS_TOKEN", "token");
        env::set_var("APP_USERNAME", "banhammer");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.store_backend, StoreBackend::Redis);
        assert_eq!(config.session_ttl_secs, 600);
        assert_eq!(config.backend_timeout_secs, 10);
        assert!(config.reddit_user_agent.starts_with("banhammer/"));
        clear();
    }

    #[test]
    #[serial]
    fn test_from_env_requires_token() {
        clear();
        env::set_var("APP_USERNAME", "banhammer");
        assert!(Config::from_env().is_err());
        clear();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear();
        env::set_var("REDDIT_ACCESS_TOKEN", "token");
        env::set_var("APP_USERNAME", "banhammer");
        env::set_var("STORE_BACKEND", "Memory");
        env::set_var("SESSION_TTL_SECS", "not-a-number");

        let config = Config::from_env().unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.session_ttl_secs, 600);

        env::set_var("STORE_BACKEND", "postgres");
        assert!(Config::from_env().is_err());
        clear();
    }
}
