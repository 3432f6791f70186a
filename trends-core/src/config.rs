use crate::{ConfigError, CoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_TWITTER_API_KEY: &str = "TRENDSAI_TWITTER_API_KEY";
pub const ENV_TWITTER_API_SECRET: &str = "TRENDSAI_TWITTER_API_SECRET";
pub const ENV_TWITTER_BEARER_TOKEN: &str = "TRENDSAI_TWITTER_BEARER_TOKEN";
pub const ENV_SCORING_API_KEY: &str = "TRENDSAI_SCORING_API_KEY";
pub const ENV_SCORING_ACCESS_TOKEN: &str = "TRENDSAI_SCORING_ACCESS_TOKEN";

/// Top ranked posts fetched per trend.
pub const DEFAULT_TWEETS_PER_TREND: u32 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Yahoo! Where On Earth id of the region to collect. `None` collects worldwide trends.
    pub woeid: Option<u64>,
    pub tweets_per_trend: u32,
    pub twitter: TwitterConfig,
    pub scoring: ScoringConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            woeid: None,
            tweets_per_trend: DEFAULT_TWEETS_PER_TREND,
            twitter: TwitterConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub api_key: Option<String>,
    pub api_secret_key: Option<String>,
    /// Pre-issued app-only token; skips the client-credentials exchange.
    pub bearer_token: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Sleep through rate-limit windows instead of failing the collection.
    pub wait_on_rate_limit: bool,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret_key: None,
            bearer_token: None,
            user_agent: "trendsai/0.1".to_string(),
            timeout_secs: 30,
            wait_on_rate_limit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
    pub max_attempts: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            access_token: None,
            endpoint: "https://language.googleapis.com".to_string(),
            timeout_secs: 30,
            max_concurrency: 4,
            max_attempts: 1,
        }
    }
}

impl ScoringConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let config: AppConfig = toml::from_str(contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the TOML file at `path`, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::Config(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }),
            _ => CoreError::Io(e),
        })?;

        debug!("Loaded configuration from {}", path.display());
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Default configuration with environment overrides, used when no file is given.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut Option<String>, name: &str| {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                debug!("Configuration value overridden by {}", name);
                *target = Some(value);
            }
        };

        set(&mut self.twitter.api_key, ENV_TWITTER_API_KEY);
        set(&mut self.twitter.api_secret_key, ENV_TWITTER_API_SECRET);
        set(&mut self.twitter.bearer_token, ENV_TWITTER_BEARER_TOKEN);
        set(&mut self.scoring.api_key, ENV_SCORING_API_KEY);
        set(&mut self.scoring.access_token, ENV_SCORING_ACCESS_TOKEN);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tweets_per_trend", self.tweets_per_trend as u64),
            ("twitter.timeout_secs", self.twitter.timeout_secs),
            ("scoring.timeout_secs", self.scoring.timeout_secs),
            ("scoring.max_concurrency", self.scoring.max_concurrency as u64),
            ("scoring.max_attempts", self.scoring.max_attempts as u64),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }

        if !self.scoring.endpoint.starts_with("http") {
            return Err(ConfigError::InvalidValue {
                field: "scoring.endpoint".to_string(),
                value: self.scoring.endpoint.clone(),
            });
        }

        Ok(())
    }
}
