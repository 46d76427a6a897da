//! # Feature: Configuration System
//!
//! Client configuration from a YAML file (with environment variable interpolation)
//! or from plain environment variables.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: YAML configuration with `${VAR}` interpolation, shortcut allowlist, history policy
//! - 1.0.0: Initial environment variable configuration

use crate::commands::builtin_shortcut_names;
use crate::history::{HistoryPolicy, DEFAULT_HISTORY_CAPACITY};
use anyhow::{Context, Result};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Largest history capacity accepted
pub const MAX_HISTORY_CAPACITY: usize = 1000;

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // ${VAR_NAME} or ${VAR_NAME:-default}
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chat server and its auxiliary endpoints
    pub server_url: String,

    /// SQLite file holding identity, theme and history (`:memory:` for none)
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    /// Number of chat entries kept in history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Whether history survives restarts
    #[serde(default)]
    pub history_policy: HistoryPolicy,

    /// Speak bot replies when a synthesizer is available
    #[serde(default = "default_speech_enabled")]
    pub speech_enabled: bool,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enabled shortcuts (empty/None = all shortcuts)
    #[serde(default)]
    pub shortcuts: Option<Vec<String>>,

    /// Timeout for every network request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

// Default value functions for serde
fn default_storage_path() -> String {
    "study_buddy.db".to_string()
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_speech_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: "http://localhost:8000".to_string(),
            storage_path: default_storage_path(),
            history_capacity: default_history_capacity(),
            history_policy: HistoryPolicy::default(),
            speech_enabled: default_speech_enabled(),
            log_level: default_log_level(),
            shortcuts: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = ClientConfig::default();
        let config = ClientConfig {
            server_url: env::var("STUDY_BUDDY_SERVER_URL").unwrap_or(defaults.server_url),
            storage_path: env::var("STUDY_BUDDY_STORAGE_PATH").unwrap_or(defaults.storage_path),
            history_capacity: match env::var("STUDY_BUDDY_HISTORY_CAPACITY") {
                Ok(raw) => raw
                    .parse()
                    .with_context(|| format!("Invalid STUDY_BUDDY_HISTORY_CAPACITY '{raw}'"))?,
                Err(_) => defaults.history_capacity,
            },
            history_policy: match env::var("STUDY_BUDDY_HISTORY_POLICY") {
                Ok(raw) => raw.parse()?,
                Err(_) => defaults.history_policy,
            },
            speech_enabled: env::var("STUDY_BUDDY_SPEECH")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.speech_enabled),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            shortcuts: env::var("STUDY_BUDDY_SHORTCUTS").ok().map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            request_timeout_secs: env::var("STUDY_BUDDY_REQUEST_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable interpolation
    ///
    /// Supports `${VAR_NAME}` and `${VAR_NAME:-default}`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;

        info!("Loaded client config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML configuration text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let interpolated = interpolate_env_vars(content)?;
        let config: ClientConfig =
            serde_yaml::from_str(&interpolated).context("Invalid configuration YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect and load configuration
    ///
    /// Priority order:
    /// 1. If CONFIG_FILE env var is set, load from that file
    /// 2. If config.yaml exists in current directory, load from it
    /// 3. Fall back to environment variables
    pub fn auto_load() -> Result<Self> {
        if let Ok(config_path) = env::var("CONFIG_FILE") {
            info!("Loading config from CONFIG_FILE: {}", config_path);
            return Self::from_file(&config_path);
        }

        let default_config_path = "config.yaml";
        if Path::new(default_config_path).exists() {
            info!("Loading config from {}", default_config_path);
            return Self::from_file(default_config_path);
        }

        info!("No config file found, using environment variables");
        Self::from_env()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            anyhow::bail!("server_url is required");
        }

        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            anyhow::bail!("server_url '{}' must start with http:// or https://", self.server_url);
        }

        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY_CAPACITY {
            anyhow::bail!(
                "history_capacity must be between 1 and {}, got {}",
                MAX_HISTORY_CAPACITY,
                self.history_capacity
            );
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }

        if let Some(ref shortcuts) = self.shortcuts {
            let known = builtin_shortcut_names();
            let unknown: Vec<_> = shortcuts
                .iter()
                .filter(|s| !known.contains(&s.as_str()))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                anyhow::bail!(
                    "Unknown shortcut(s): {}. Use: {}",
                    unknown.join(", "),
                    known.join(", ")
                );
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shortcut allowlist, `None` when every shortcut is enabled
    pub fn shortcut_allowlist(&self) -> Option<&[String]> {
        self.shortcuts.as_deref().filter(|s| !s.is_empty())
    }
}

/// Interpolate environment variables in a string
///
/// Unset variables without a default are collected and reported together.
fn interpolate_env_vars(content: &str) -> Result<String> {
    let mut missing = Vec::new();

    let result = ENV_VAR_PATTERN.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => match caps.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    missing.push(format!("Environment variable '{}' is not set", var_name));
                    String::new()
                }
            },
        }
    });

    if !missing.is_empty() {
        anyhow::bail!("Missing environment variables:\n  - {}", missing.join("\n  - "));
    }

    Ok(result.into_owned())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_interpolate_env_vars_simple() {
        env::set_var("SB_TEST_VAR_1", "value1");
        let result = interpolate_env_vars("key: ${SB_TEST_VAR_1}").unwrap();
        assert_eq!(result, "key: value1");
        env::remove_var("SB_TEST_VAR_1");
    }

    #[test]
    fn test_interpolate_env_vars_with_default() {
        env::remove_var("SB_NONEXISTENT_VAR");
        let result = interpolate_env_vars("key: ${SB_NONEXISTENT_VAR:-default_value}").unwrap();
        assert_eq!(result, "key: default_value");
    }

    #[test]
    fn test_interpolate_env_vars_missing_no_default() {
        env::remove_var("SB_MISSING_VAR_FOR_TEST");
        let result = interpolate_env_vars("key: ${SB_MISSING_VAR_FOR_TEST}");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("SB_MISSING_VAR_FOR_TEST"));
    }

    #[test]
    fn test_config_from_yaml() {
        env::set_var("SB_TEST_SERVER", "https://buddy.example.com");

        let yaml = r#"
server_url: "${SB_TEST_SERVER}"
storage_path: "test.db"
history_capacity: 250
history_policy: session
speech_enabled: false
shortcuts: ["translate", "quiz"]
"#;

        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server_url, "https://buddy.example.com");
        assert_eq!(config.storage_path, "test.db");
        assert_eq!(config.history_capacity, 250);
        assert_eq!(config.history_policy, HistoryPolicy::Session);
        assert!(!config.speech_enabled);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.shortcut_allowlist(),
            Some(&["translate".to_string(), "quiz".to_string()][..])
        );

        env::remove_var("SB_TEST_SERVER");
    }

    #[test]
    fn test_config_yaml_defaults() {
        let config = ClientConfig::from_yaml("server_url: http://localhost:5000\n").unwrap();
        assert_eq!(config.history_capacity, DEFAULT_HISTORY_CAPACITY);
        assert_eq!(config.history_policy, HistoryPolicy::Persistent);
        assert!(config.speech_enabled);
        assert!(config.shortcut_allowlist().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_capacity() {
        let config = ClientConfig {
            history_capacity: 0,
            ..ClientConfig::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("history_capacity"));
    }

    #[test]
    fn test_validation_rejects_unknown_shortcut() {
        let config = ClientConfig {
            shortcuts: Some(vec!["translate".to_string(), "horoscope".to_string()]),
            ..ClientConfig::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("horoscope"));
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let config = ClientConfig {
            server_url: "localhost:8000".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(ClientConfig::default().validate().is_ok());
    }
}
