//! Startup configuration.
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file) and are read exactly once into an immutable [`AppConfig`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::monitor::RemovedComponentPolicy;
use crate::notification::{EmojiStyle, PayloadFormat};

/// Default status summary endpoint.
pub const DEFAULT_STATUS_API_URL: &str = "https://www.githubstatus.com/api/v2/summary.json";

/// Default delay between polling cycles.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "status_monitor=info";

const WEBHOOK_URL_KEYS: &[&str] = &["WEBHOOK_URL", "TEAMS_WEBHOOK_URL"];
const STATUS_API_URL_KEYS: &[&str] = &["STATUS_API_URL", "GITHUB_STATUS_API_URL"];

/// Immutable application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Webhook notifications are POSTed to.
    pub webhook_url: Url,
    /// Status summary endpoint polled each cycle.
    pub status_api_url: Url,
    /// Delay between cycles.
    pub check_interval: Duration,
    /// Send a full summary on the very first successful fetch.
    pub notify_on_first_run: bool,
    /// Outbound JSON shape.
    pub payload_format: PayloadFormat,
    /// Emoji set used for statuses.
    pub emoji_style: EmojiStyle,
    /// What to do with components that disappear from the feed.
    pub removed_components: RemovedComponentPolicy,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let webhook_url = match env.first_of(WEBHOOK_URL_KEYS) {
            Some((key, raw)) => parse_http_url(key, &raw)?,
            None => {
                return Err(ConfigError::Missing {
                    key: WEBHOOK_URL_KEYS[0],
                });
            }
        };

        let status_api_url = match env.first_of(STATUS_API_URL_KEYS) {
            Some((key, raw)) => parse_http_url(key, &raw)?,
            None => parse_http_url(STATUS_API_URL_KEYS[0], DEFAULT_STATUS_API_URL)?,
        };

        let check_interval = Duration::from_secs(
            env.positive_secs("CHECK_INTERVAL_SECONDS")?
                .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS),
        );
        let request_timeout = Duration::from_secs(
            env.positive_secs("REQUEST_TIMEOUT_SECONDS")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        // LogSettings falls back to pretty output; a bad value still fails here.
        env.choice::<LogFormat>("LOG_FORMAT")?;

        Ok(Self {
            webhook_url,
            status_api_url,
            check_interval,
            notify_on_first_run: env.flag("NOTIFY_ON_FIRST_RUN")?.unwrap_or(false),
            payload_format: env.choice("PAYLOAD_FORMAT")?.unwrap_or_default(),
            emoji_style: env.choice("EMOJI_STYLE")?.unwrap_or_default(),
            removed_components: env.choice("REMOVED_COMPONENTS")?.unwrap_or_default(),
            request_timeout,
        })
    }
}

/// Console log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}', expected pretty or json", other)),
        }
    }
}

/// Logging settings, read before [`AppConfig`] so configuration errors can be logged.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub format: LogFormat,
    /// Directory for the daily rolling log file, if any.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::Pretty,
            log_dir: None,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Never fails: an unknown `LOG_FORMAT` falls back to pretty output here
    /// and is reported by [`AppConfig::from_lookup`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);
        Self {
            format: env
                .get("LOG_FORMAT")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or_default(),
            log_dir: env.get("LOG_DIR").map(PathBuf::from),
            ..Default::default()
        }
    }
}

/// Environment lookup that treats blank values as unset.
struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn first_of(&self, keys: &[&'static str]) -> Option<(&'static str, String)> {
        keys.iter()
            .find_map(|key| self.get(key).map(|value| (*key, value)))
    }

    fn positive_secs(&self, key: &'static str) -> Result<Option<u64>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.parse::<u64>() {
            Ok(0) => Err(ConfigError::invalid(key, raw, "must be greater than zero")),
            Ok(secs) => Ok(Some(secs)),
            Err(e) => Err(ConfigError::invalid(key, raw, e.to_string())),
        }
    }

    fn flag(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
        }
    }

    fn choice<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr<Err = String>,
    {
        self.get(key)
            .map(|raw| raw.parse().map_err(|reason| ConfigError::invalid(key, raw, reason)))
            .transpose()
    }
}

fn parse_http_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::invalid(key, raw, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::invalid(
            key,
            raw,
            format!("unsupported scheme '{}'", scheme),
        )),
    }
}
