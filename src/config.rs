//! Runtime configuration from the environment (and `.env`).

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::analytics::{AnalyticsOptions, TimeBucket};

pub const DEFAULT_DATA_PATH: &str = "data/sample_transactions.csv";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the remote insight service.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    /// Credential; `None` disables the insight feature
    pub api_key: Option<String>,

    /// Chat model name
    pub model: String,

    /// Base URL of an OpenAI-compatible API
    pub api_base: String,

    /// Overall deadline for one insight request, retries included
    pub timeout: Duration,

    /// Sampling temperature
    pub temperature: f64,

    /// Completion token limit
    pub max_tokens: u32,
}

impl InsightConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input CSV location
    pub data_path: PathBuf,

    /// Analytics knobs
    pub analytics: AnalyticsOptions,

    /// Insight service settings
    pub insight: InsightConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            analytics: AnalyticsOptions::default(),
            insight: InsightConfig::default(),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read recognised variables over the defaults.
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(path) = get("PORTFOLIO_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }
        config.insight.api_key = get("OPENAI_API_KEY");
        if let Some(model) = get("INSIGHT_MODEL") {
            config.insight.model = model;
        }
        if let Some(base) = get("INSIGHT_API_BASE") {
            config.insight.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("INSIGHT_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.insight.timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "Ignoring invalid INSIGHT_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = get("TIME_BUCKET") {
            match raw.parse::<TimeBucket>() {
                Ok(bucket) => config.analytics.bucket = bucket,
                Err(e) => warn!(error = %e, "Ignoring invalid TIME_BUCKET"),
            }
        }
        if let Some(raw) = get("TOP_TRADERS") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => config.analytics.top_traders = n,
                _ => warn!(value = %raw, "Ignoring invalid TOP_TRADERS"),
            }
        }

        config
    }
}
