//! Client configuration.
//!
//! Provides [`ClientConfig`] for constructing a [`Client`](crate::Client).
//! Values can be set through the builder or loaded from environment variables.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::deferred::{DEFAULT_MAX_ATTEMPTS, DeferredPolicy};
use crate::error::ConfigError;

/// BSD Tools client configuration.
///
/// # Examples
///
/// ```
/// use bsdtools_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_id("someone".into())
///     .api_secret("some_secret".into())
///     .base_url("https://client.cp.bsd.net".into())
///     .build();
/// assert_eq!(config.deferred_interval_secs, 5);
/// assert_eq!(config.deferred_max_attempts, 20);
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// API identifier (`api_id`).
    #[builder(default)]
    #[serde(default)]
    pub api_id: String,

    /// API secret. Never serialized.
    #[builder(default)]
    #[serde(default, skip_serializing)]
    pub api_secret: String,

    /// Root URL of the BSD Tools install, e.g. `https://client.cp.bsd.net`.
    #[builder(default)]
    #[serde(default)]
    pub base_url: String,

    /// Seconds to wait before each deferred-result poll.
    #[builder(default = 5)]
    #[serde(default = "default_interval_secs")]
    pub deferred_interval_secs: u64,

    /// Maximum number of deferred-result polls.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    #[serde(default = "default_max_attempts")]
    pub deferred_max_attempts: u32,

    /// Whether 202 responses are resolved by polling.
    #[builder(default = true)]
    #[serde(default = "default_true")]
    pub process_deferred_results: bool,

    /// Fail instead of returning when polling ends on an unexpected status.
    #[builder(default = false)]
    #[serde(default)]
    pub fail_on_unexpected_status: bool,

    /// Per-request timeout in seconds.
    #[builder(default = 10)]
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    String::from("info")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_id", &self.api_id)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("deferred_interval_secs", &self.deferred_interval_secs)
            .field("deferred_max_attempts", &self.deferred_max_attempts)
            .field("process_deferred_results", &self.process_deferred_results)
            .field("fail_on_unexpected_status", &self.fail_on_unexpected_status)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BSD_API_ID` | *(empty)* |
    /// | `BSD_API_SECRET` | *(empty)* |
    /// | `BSD_API_BASEURL` | *(empty)* |
    /// | `BSD_DEFERRED_INTERVAL` | `5` |
    /// | `BSD_DEFERRED_MAX_ATTEMPTS` | `20` |
    /// | `BSD_PROCESS_DEFERRED` | `true` |
    /// | `BSD_FAIL_ON_UNEXPECTED_STATUS` | `false` |
    /// | `BSD_REQUEST_TIMEOUT` | `10` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("BSD_API_ID") {
            config.api_id = v;
        }
        if let Some(v) = lookup("BSD_API_SECRET") {
            config.api_secret = v;
        }
        if let Some(v) = lookup("BSD_API_BASEURL") {
            config.base_url = v;
        }
        if let Some(v) = lookup("BSD_DEFERRED_INTERVAL") {
            config.deferred_interval_secs = parse_number("BSD_DEFERRED_INTERVAL", v)?;
        }
        if let Some(v) = lookup("BSD_DEFERRED_MAX_ATTEMPTS") {
            config.deferred_max_attempts = parse_number("BSD_DEFERRED_MAX_ATTEMPTS", v)?;
        }
        if let Some(v) = lookup("BSD_PROCESS_DEFERRED") {
            config.process_deferred_results = parse_bool(&v);
        }
        if let Some(v) = lookup("BSD_FAIL_ON_UNEXPECTED_STATUS") {
            config.fail_on_unexpected_status = parse_bool(&v);
        }
        if let Some(v) = lookup("BSD_REQUEST_TIMEOUT") {
            config.request_timeout_secs = parse_number("BSD_REQUEST_TIMEOUT", v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// The deferred-result policy described by this configuration.
    #[must_use]
    pub fn deferred_policy(&self) -> DeferredPolicy {
        DeferredPolicy {
            enabled: self.process_deferred_results,
            interval: Duration::from_secs(self.deferred_interval_secs),
            max_attempts: self.deferred_max_attempts,
            fail_on_unexpected_status: self.fail_on_unexpected_status,
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
