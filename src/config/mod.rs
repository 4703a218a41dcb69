//! Configuration for a courier run.
//!
//! Values come from an optional TOML file, overridden by environment
//! variables (a `.env` file is loaded first by the binary). The result is a
//! single [`AppConfig`] built at startup and passed by reference; nothing
//! else in the crate reads the environment.
//!
//! ```toml
//! [feed]
//! url = "https://example.com/feed.xml"
//! timeout_secs = 10
//!
//! [telegram]
//! bot_token = "123456:ABC"
//! chat_id = "@my_channel"
//!
//! [state]
//! file = "/var/lib/feed-courier/feed_cache.json"
//!
//! [delivery]
//! cold_start = "seed"   # seed | latest | all
//! max_entries = 20
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::delivery::telegram::{DEFAULT_API_BASE, DEFAULT_SEND_TIMEOUT};
use crate::fetcher::http_fetcher::DEFAULT_FETCH_TIMEOUT;
use crate::resolver::{ColdStartPolicy, ResolveOptions};
use crate::store::json::DEFAULT_STATE_FILE;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_FEED_URL: &str = "RSS_FEED_URL";
pub const ENV_API_BASE: &str = "TELEGRAM_API_BASE";
pub const ENV_STATE_FILE: &str = "FEED_COURIER_STATE_FILE";
pub const ENV_FETCH_TIMEOUT: &str = "FEED_COURIER_FETCH_TIMEOUT_SECS";
pub const ENV_SEND_TIMEOUT: &str = "FEED_COURIER_SEND_TIMEOUT_SECS";
pub const ENV_COLD_START: &str = "FEED_COURIER_COLD_START";
pub const ENV_MAX_ENTRIES: &str = "FEED_COURIER_MAX_ENTRIES";

const FILE_MAX_ENTRIES: &str = "[delivery] max_entries";

/// Contents of the optional TOML config file. Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub feed: FeedSection,
    pub telegram: TelegramSection,
    pub state: StateSection,
    pub delivery: DeliverySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateSection {
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeliverySection {
    pub cold_start: Option<ColdStartPolicy>,
    pub max_entries: Option<usize>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Fully resolved configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub feed_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub telegram_api_base: String,
    pub state_file: PathBuf,
    pub fetch_timeout: Duration,
    pub send_timeout: Duration,
    pub cold_start: ColdStartPolicy,
    pub max_entries: Option<usize>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("feed_url", &self.feed_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("state_file", &self.state_file)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("send_timeout", &self.send_timeout)
            .field("cold_start", &self.cold_start)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl AppConfig {
    /// Reads the optional config file, then the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Merges `file` with values from `env`, which take precedence, and
    /// validates the result.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let state_file = resolve_state_file(&file, &env);

        let lookup = |name: &str, fallback: Option<String>| {
            env(name)
                .or(fallback)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = lookup(ENV_BOT_TOKEN, file.telegram.bot_token)
            .ok_or(ConfigError::Missing(ENV_BOT_TOKEN))?;
        let chat_id = lookup(ENV_CHAT_ID, file.telegram.chat_id)
            .ok_or(ConfigError::Missing(ENV_CHAT_ID))?;
        let feed_url = lookup(ENV_FEED_URL, file.feed.url)
            .ok_or(ConfigError::Missing(ENV_FEED_URL))?;
        validate_url(&feed_url)?;

        let telegram_api_base = lookup(ENV_API_BASE, file.telegram.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        validate_url(&telegram_api_base)?;

        let fetch_timeout = match lookup(ENV_FETCH_TIMEOUT, None) {
            Some(v) => parse_secs(ENV_FETCH_TIMEOUT, &v)?,
            None => file
                .feed
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT),
        };

        let send_timeout = match lookup(ENV_SEND_TIMEOUT, None) {
            Some(v) => parse_secs(ENV_SEND_TIMEOUT, &v)?,
            None => file
                .telegram
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SEND_TIMEOUT),
        };

        let cold_start = match lookup(ENV_COLD_START, None) {
            Some(v) => v.parse().map_err(|reason| ConfigError::InvalidValue {
                name: ENV_COLD_START,
                value: v.clone(),
                reason,
            })?,
            None => file.delivery.cold_start.unwrap_or_default(),
        };

        let (max_entries, max_entries_source) = match lookup(ENV_MAX_ENTRIES, None) {
            Some(v) => {
                let parsed = v.parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                    name: ENV_MAX_ENTRIES,
                    value: v.clone(),
                    reason: e.to_string(),
                })?;
                (Some(parsed), ENV_MAX_ENTRIES)
            }
            None => (file.delivery.max_entries, FILE_MAX_ENTRIES),
        };
        if max_entries == Some(0) {
            return Err(ConfigError::InvalidValue {
                name: max_entries_source,
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            feed_url,
            bot_token,
            chat_id,
            telegram_api_base,
            state_file,
            fetch_timeout,
            send_timeout,
            cold_start,
            max_entries,
        })
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            cold_start: self.cold_start,
            max_entries: self.max_entries,
        }
    }
}

/// Locates the state file without requiring the rest of the configuration.
pub fn state_file_path(config_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let file = match config_path {
        Some(path) => FileConfig::from_path(path)?,
        None => FileConfig::default(),
    };
    Ok(resolve_state_file(&file, |name| std::env::var(name).ok()))
}

fn resolve_state_file<F>(file: &FileConfig, env: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    env(ENV_STATE_FILE)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| file.state.file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
}

fn validate_url(value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        url: value.to_string(),
        source: e,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
