//! Runtime configuration, read from the environment with CLI overrides.

use std::path::PathBuf;

use crate::http_client::{HttpAuth, DEFAULT_TIMEOUT_MS};
use crate::MAX_WATCHLIST_SIZE;

pub const ENV_API_BASE: &str = "TICKERWATCH_API_BASE";
pub const ENV_API_TOKEN: &str = "TICKERWATCH_API_TOKEN";
pub const ENV_CACHE_DIR: &str = "TICKERWATCH_CACHE_DIR";
pub const ENV_TIMEOUT_MS: &str = "TICKERWATCH_TIMEOUT_MS";

pub const DEFAULT_API_BASE: &str = "http://localhost:3000";
pub const DEFAULT_CACHE_DIR: &str = ".tickerwatch";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistConfig {
    pub api_base_url: String,
    pub auth: HttpAuth,
    pub cache_dir: PathBuf,
    /// Applied to every remote call; a timeout counts as a remote failure.
    pub timeout_ms: u64,
    pub max_entries: usize,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::from(DEFAULT_API_BASE),
            auth: HttpAuth::None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_entries: MAX_WATCHLIST_SIZE,
        }
    }
}

impl WatchlistConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparsable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = base.trim().trim_end_matches('/').to_owned();
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            config.auth = HttpAuth::BearerToken(token.trim().to_owned());
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR).filter(|v| !v.trim().is_empty()) {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(value) if value > 0 => config.timeout_ms = value,
                _ => tracing::warn!(
                    value = %raw,
                    default = DEFAULT_TIMEOUT_MS,
                    "ignoring invalid TICKERWATCH_TIMEOUT_MS"
                ),
            }
        }

        config
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.min(MAX_WATCHLIST_SIZE);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = WatchlistConfig::from_lookup(|_| None);
        assert_eq!(config, WatchlistConfig::default());
        assert_eq!(config.max_entries, 50);
    }

    #[test]
    fn reads_every_variable() {
        let config = WatchlistConfig::from_lookup(lookup_from(&[
            (ENV_API_BASE, "https://api.example.test/prod/"),
            (ENV_API_TOKEN, "abc"),
            (ENV_CACHE_DIR, "/tmp/tw"),
            (ENV_TIMEOUT_MS, "1500"),
        ]));

        assert_eq!(config.api_base_url, "https://api.example.test/prod");
        assert_eq!(config.auth, HttpAuth::BearerToken(String::from("abc")));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/tw"));
        assert_eq!(config.timeout_ms, 1500);
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        let config = WatchlistConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_MS, "soon")]));
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);

        let config = WatchlistConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_MS, "0")]));
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn max_entries_cannot_exceed_global_limit() {
        let config = WatchlistConfig::default().with_max_entries(80);
        assert_eq!(config.max_entries, MAX_WATCHLIST_SIZE);
    }
}
