//! Environment driven settings.

use std::env;
use std::str::FromStr;

use crate::AppError;
use search_sync_repository::config::DEFAULT_INDEX_NAME;
use search_sync_repository::IndexConfig;

/// Default OpenSearch URL.
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default tracing filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(AppError::config(format!("unknown LOG_FORMAT: {}", other))),
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Settings of the sync layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub opensearch_url: String,
    pub index: IndexConfig,
    /// Default highlight flattening for record types built by [`crate::Dependencies`].
    pub flatten_single_highlight: bool,
    pub log: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            index: IndexConfig::new(DEFAULT_INDEX_NAME),
            flatten_single_highlight: false,
            log: LogConfig::default(),
        }
    }
}

impl Settings {
    /// Read settings from the environment, loading `.env` first.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `SEARCH_INDEX_NAME`: Logical index name (default: default)
    /// - `SEARCH_INDEX_SHARDS`: Shards per created index (default: 1)
    /// - `SEARCH_INDEX_REPLICAS`: Replicas per created index (default: 1)
    /// - `SEARCH_FLATTEN_SINGLE_HIGHLIGHT`: Flatten one-fragment highlights (default: false)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let index = IndexConfig::new(
            lookup("SEARCH_INDEX_NAME").unwrap_or(defaults.index.name),
        )
        .with_shards(parse_or(&lookup, "SEARCH_INDEX_SHARDS", defaults.index.number_of_shards)?)
        .with_replicas(parse_or(
            &lookup,
            "SEARCH_INDEX_REPLICAS",
            defaults.index.number_of_replicas,
        )?);

        if index.name.trim().is_empty() {
            return Err(AppError::config("SEARCH_INDEX_NAME must not be empty"));
        }

        let format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => defaults.log.format,
        };

        Ok(Self {
            opensearch_url: lookup("OPENSEARCH_URL").unwrap_or(defaults.opensearch_url),
            index,
            flatten_single_highlight: parse_or(
                &lookup,
                "SEARCH_FLATTEN_SINGLE_HIGHLIGHT",
                defaults.flatten_single_highlight,
            )?,
            log: LogConfig {
                format,
                default_filter: defaults.log.default_filter,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("invalid {}={}: {}", key, value, e))),
        None => Ok(default),
    }
}
