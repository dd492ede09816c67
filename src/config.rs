use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Collection
    pub window_days: i64,
    pub html_max_articles: usize,
    pub fb_post_limit: usize,
    pub tweet_limit: usize,

    // Classification oracle (Ollama)
    pub ollama_url: String,
    pub ollama_model: String,
    pub auto_classify: bool,

    // Moderation oracle
    pub moderation_url: Option<String>,
    pub moderation_max_items: i64,

    // Social API credentials
    pub facebook_access_token: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub facebook_api_url: String,
    pub twitter_api_url: String,

    // Scheduler
    pub schedule_poll_interval: Duration,
    pub campaign_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_path: PathBuf::from(env_or_default(
                "DATABASE_PATH",
                "./data/mediascan.sqlite",
            )),

            window_days: parse_env_i64("WINDOW_DAYS", 30)?,
            html_max_articles: parse_env_usize("HTML_MAX_ARTICLES", 100)?,
            fb_post_limit: parse_env_usize("FB_POST_LIMIT", 5)?,
            tweet_limit: parse_env_usize("TWEET_LIMIT", 5)?,

            ollama_url: env_or_default("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: env_or_default("OLLAMA_MODEL", "mistral"),
            auto_classify: parse_env_bool("AUTO_CLASSIFY", true)?,

            moderation_url: optional_env("MODERATION_URL"),
            moderation_max_items: parse_env_i64("MODERATION_MAX_ITEMS", 200)?,

            facebook_access_token: optional_env("FACEBOOK_ACCESS_TOKEN"),
            twitter_bearer_token: optional_env("TWITTER_BEARER_TOKEN"),
            facebook_api_url: env_or_default(
                "FACEBOOK_API_URL",
                "https://graph.facebook.com/v18.0",
            ),
            twitter_api_url: env_or_default("TWITTER_API_URL", "https://api.twitter.com/2"),

            schedule_poll_interval: Duration::from_secs(parse_env_u64(
                "SCHEDULE_POLL_INTERVAL_SECS",
                60,
            )?),
            campaign_timeout: Duration::from_secs(parse_env_u64("CAMPAIGN_TIMEOUT_SECS", 600)?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days < 1 {
            return Err(ConfigError::InvalidValue {
                name: "WINDOW_DAYS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.html_max_articles == 0 {
            return Err(ConfigError::InvalidValue {
                name: "HTML_MAX_ARTICLES".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.campaign_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "CAMPAIGN_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// A configuration suitable for tests: no real credentials, short
    /// timeouts, classification disabled unless the test enables it.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            database_path: PathBuf::from(":memory:"),
            window_days: 30,
            html_max_articles: 100,
            fb_post_limit: 5,
            tweet_limit: 5,
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "mistral".to_string(),
            auto_classify: false,
            moderation_url: None,
            moderation_max_items: 200,
            facebook_access_token: None,
            twitter_bearer_token: None,
            facebook_api_url: "https://graph.facebook.com/v18.0".to_string(),
            twitter_api_url: "https://api.twitter.com/2".to_string(),
            schedule_poll_interval: Duration::from_millis(50),
            campaign_timeout: Duration::from_secs(30),
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_i64(name: &str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = Config {
            window_days: 0,
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_for_testing_is_valid() {
        assert!(Config::for_testing().validate().is_ok());
    }
}
