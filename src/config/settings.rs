use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::resilience::retry::RetryPolicy;
use crate::utils::constants::{
    DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_MAX_RETRIES, DEFAULT_RATE_LIMIT_DELAY_MS,
    DEFAULT_SAFETY_MARGIN_SECS, TDX_AUTH_URL, TDX_URL_BASE,
};

/// ================================
/// Proxy-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProxySettings {
    pub base_url: String,
    pub auth_url: String,
    /// applied to every single HTTP attempt
    pub timeout_ms: u64,
    pub safety_margin_seconds: i64,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
    pub credentials_file: Option<PathBuf>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            base_url: TDX_URL_BASE.to_owned(),
            auth_url: TDX_AUTH_URL.to_owned(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            safety_margin_seconds: DEFAULT_SAFETY_MARGIN_SECS,
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
            credentials_file: None,
        }
    }
}

impl ProxySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// retries after the first attempt, for 401 and 429 only
    pub max_retries: u32,
    /// wait before retrying a 429
    pub rate_limit_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_delay_ms: DEFAULT_RATE_LIMIT_DELAY_MS,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy {
            max_retries: cfg.max_retries,
            rate_limit_delay: Duration::from_millis(cfg.rate_limit_delay_ms),
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}
