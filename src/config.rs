//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::loader::{COMMON_MODULE, DEFAULT_PAGE_ID, PAGES_BASE_PATH, PAGE_ATTRIBUTE};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub ping: PingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Page loader configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoaderConfig {
    /// Directory page modules are served from
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Page identifier used when the document declares none
    #[serde(default = "default_page")]
    pub default_page: String,

    /// Shared module run before every page module
    #[serde(default = "default_common_module")]
    pub common_module: String,

    /// Body attribute holding the page identifier
    #[serde(default = "default_page_attribute")]
    pub page_attribute: String,
}

fn default_base_path() -> String {
    PAGES_BASE_PATH.to_string()
}

fn default_page() -> String {
    DEFAULT_PAGE_ID.to_string()
}

fn default_common_module() -> String {
    COMMON_MODULE.to_string()
}

fn default_page_attribute() -> String {
    PAGE_ATTRIBUTE.to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            default_page: default_page(),
            common_module: default_common_module(),
            page_attribute: default_page_attribute(),
        }
    }
}

/// Latency benchmark configuration (native hosts)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PingConfig {
    /// Origin relative endpoints are resolved against
    #[serde(default = "default_ping_base_url")]
    pub base_url: String,

    #[serde(default = "default_ping_timeout")]
    pub timeout_secs: u64,
}

fn default_ping_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ping_timeout() -> u64 {
    10
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            base_url: default_ping_base_url(),
            timeout_secs: default_ping_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::default_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Locations searched by [`Config::load_default`], in order
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("z8-islands").join("config.toml")),
            Some(PathBuf::from("./z8-islands.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Loader overrides
        if let Some(base) = var("Z8_PAGES_BASE") {
            self.loader.base_path = base;
        }
        if let Some(page) = var("Z8_DEFAULT_PAGE") {
            self.loader.default_page = page;
        }
        if let Some(attribute) = var("Z8_PAGE_ATTRIBUTE") {
            self.loader.page_attribute = attribute;
        }

        // Ping overrides
        if let Some(url) = var("Z8_PING_BASE_URL") {
            self.ping.base_url = url;
        }

        // Logging overrides
        if let Some(level) = var("Z8_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("Z8_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# z8-islands Configuration
#
# Environment variables override these settings:
# - Z8_PAGES_BASE
# - Z8_DEFAULT_PAGE
# - Z8_PAGE_ATTRIBUTE
# - Z8_PING_BASE_URL
# - Z8_LOG_LEVEL
# - Z8_LOG_FORMAT

[loader]
# Directory page modules are served from
base_path = "/static/js/pages/"

# Page identifier used when <body> has no data-page attribute
default_page = "default"

# Module run before every page module
common_module = "common"

# Body attribute holding the page identifier
page_attribute = "data-page"

[ping]
# Origin relative endpoints are resolved against
base_url = "http://localhost:8080"

# Request timeout in seconds
timeout_secs = 10

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_template_parses_to_defaults() {
        let parsed = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(parsed.loader, LoaderConfig::default());
        assert_eq!(parsed.ping, PingConfig::default());
        assert_eq!(parsed.logging, LoggingConfig::default());
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[loader]\nbase_path = \"/assets/pages/\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.loader.base_path, "/assets/pages/");
        assert_eq!(config.loader.default_page, "default");
        assert_eq!(config.loader.page_attribute, "data-page");
        assert_eq!(config.ping.timeout_secs, 10);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[loader\nbase_path = 1").unwrap();
        assert!(matches!(Config::load(&broken), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("Z8_PAGES_BASE", "/js/"),
            ("Z8_DEFAULT_PAGE", "home"),
            ("Z8_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.loader.base_path, "/js/");
        assert_eq!(config.loader.default_page, "home");
        assert_eq!(config.loader.common_module, "common");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }
}
