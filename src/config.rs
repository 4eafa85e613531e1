use std::path::PathBuf;
use std::time::Duration;

use crate::gateway::client::{DEFAULT_API_BASE, DEFAULT_MODEL};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings loaded from environment variables.
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    pub sentry_dsn: Option<String>,
    pub environment: String,
}

/// Raw environment values, one field per variable.
#[derive(Default)]
pub struct RawConfig<'a> {
    pub api_key: Option<&'a str>,
    pub model: Option<&'a str>,
    pub api_base: Option<&'a str>,
    pub data_dir: Option<&'a str>,
    pub timeout_secs: Option<&'a str>,
    pub sentry_dsn: Option<&'a str>,
    pub environment: Option<&'a str>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        let api_key = var("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()).or_else(|| var("VITE_GEMINI_API_KEY"));
        let model = var("IDEAFY_MODEL");
        let api_base = var("IDEAFY_API_BASE");
        let data_dir = var("IDEAFY_DATA_DIR");
        let timeout_secs = var("IDEAFY_TIMEOUT_SECS");
        let sentry_dsn = var("SENTRY_DSN");
        let environment = var("ENVIRONMENT");

        Self::from_raw_values(RawConfig {
            api_key: api_key.as_deref(),
            model: model.as_deref(),
            api_base: api_base.as_deref(),
            data_dir: data_dir.as_deref(),
            timeout_secs: timeout_secs.as_deref(),
            sentry_dsn: sentry_dsn.as_deref(),
            environment: environment.as_deref(),
        })
    }

    /// Build a Config from raw string values (as they would come from env vars).
    /// Used directly in tests to avoid mutating process-global environment.
    pub fn from_raw_values(raw: RawConfig<'_>) -> Self {
        let data_dir = non_empty(raw.data_dir).map(PathBuf::from).unwrap_or_else(default_data_dir);

        let timeout_secs = raw
            .timeout_secs
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Config {
            api_key: non_empty(raw.api_key).map(String::from),
            model: non_empty(raw.model).unwrap_or(DEFAULT_MODEL).to_string(),
            api_base: non_empty(raw.api_base).unwrap_or(DEFAULT_API_BASE).to_string(),
            data_dir,
            request_timeout: Duration::from_secs(timeout_secs),
            sentry_dsn: non_empty(raw.sentry_dsn).map(String::from),
            environment: non_empty(raw.environment).unwrap_or("local").to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ideafy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::from_raw_values(RawConfig::default());
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.api_base, "https://generativelanguage.googleapis.com");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(config.data_dir.ends_with(".ideafy"));
        assert!(config.sentry_dsn.is_none());
        assert_eq!(config.environment, "local");
    }

    #[test]
    fn test_config_empty_api_key_is_none() {
        let config = Config::from_raw_values(RawConfig {
            api_key: Some("  "),
            ..Default::default()
        });
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_present_values() {
        let config = Config::from_raw_values(RawConfig {
            api_key: Some("abc"),
            model: Some("gemini-2.5-pro"),
            data_dir: Some("/tmp/ideafy-test"),
            timeout_secs: Some("30"),
            sentry_dsn: Some("https://sentry.io/123"),
            environment: Some("prod"),
            ..Default::default()
        });
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ideafy-test"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.sentry_dsn.as_deref(), Some("https://sentry.io/123"));
        assert_eq!(config.environment, "prod");
    }

    #[test]
    fn test_config_invalid_timeout_uses_default() {
        for bad in ["soon", "0", "-5"] {
            let config = Config::from_raw_values(RawConfig {
                timeout_secs: Some(bad),
                ..Default::default()
            });
            assert_eq!(config.request_timeout, Duration::from_secs(120), "input {bad}");
        }
    }

    #[test]
    fn test_config_empty_sentry_dsn_is_none() {
        let config = Config::from_raw_values(RawConfig {
            sentry_dsn: Some(""),
            ..Default::default()
        });
        assert!(config.sentry_dsn.is_none());
    }
}
