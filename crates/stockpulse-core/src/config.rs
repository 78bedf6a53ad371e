use std::num::NonZeroU32;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::retry::RetryPolicy;
use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEMO_API_KEY: &str = "demo";

pub const API_KEY_ENV: &str = "STOCKPULSE_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";
pub const BASE_URL_ENV: &str = "STOCKPULSE_BASE_URL";
pub const CACHE_TTL_ENV: &str = "STOCKPULSE_CACHE_TTL_MS";
pub const REQUESTS_PER_MINUTE_ENV: &str = "STOCKPULSE_REQUESTS_PER_MINUTE";

/// Settings for [`crate::StockDataClient`].
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub cache_ttl: Duration,
    pub default_policy: RetryPolicy,
    pub rate_limit_policy: RetryPolicy,
    /// Client-side pacing; `None` sends requests as fast as callers ask.
    pub requests_per_minute: Option<NonZeroU32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::from(DEMO_API_KEY),
            base_url: String::from(DEFAULT_BASE_URL),
            cache_ttl: DEFAULT_CACHE_TTL,
            default_policy: RetryPolicy::default(),
            rate_limit_policy: RetryPolicy::rate_limit(),
            requests_per_minute: None,
        }
    }
}

impl ClientConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_requests_per_minute(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = Some(requests_per_minute);
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset or blank variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(api_key) = read(API_KEY_ENV).or_else(|| read(FALLBACK_API_KEY_ENV)) {
            config.api_key = api_key;
        }

        if let Some(base_url) = read(BASE_URL_ENV) {
            config.base_url = base_url;
        }

        if let Some(value) = read(CACHE_TTL_ENV) {
            let millis = parse_positive(CACHE_TTL_ENV, &value)?;
            config.cache_ttl = Duration::from_millis(u64::from(millis.get()));
        }

        if let Some(value) = read(REQUESTS_PER_MINUTE_ENV) {
            config.requests_per_minute = Some(parse_positive(REQUESTS_PER_MINUTE_ENV, &value)?);
        }

        Ok(config)
    }

    pub fn uses_demo_key(&self) -> bool {
        self.api_key == DEMO_API_KEY
    }
}

// The API key stays out of debug output.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("cache_ttl", &self.cache_ttl)
            .field("default_policy", &self.default_policy)
            .field("rate_limit_policy", &self.rate_limit_policy)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<NonZeroU32, ConfigError> {
    value
        .parse::<NonZeroU32>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_owned(),
        })
}
