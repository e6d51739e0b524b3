//! Configuration management for pdscreend.
//!
//! Loads settings from /etc/pdscreen/config.toml or uses defaults.
//! An explicit path (from `--config` or `$PDSCREEN_CONFIG`) must exist.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/pdscreen/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/pdscreen/config.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "PDSCREEN_CONFIG";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// CORS origins allowed to call the API (empty = any origin)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_max_body_bytes() -> usize {
    crate::network::MAX_BODY_SIZE
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Model artifact location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("classifier.json")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

/// Decision policy tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Non-zero numeric features required before the model is used
    #[serde(default = "default_numeric_threshold")]
    pub numeric_threshold: usize,
}

fn default_numeric_threshold() -> usize {
    pdscreen_common::NUMERIC_THRESHOLD
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            numeric_threshold: default_numeric_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from an explicit path, `$PDSCREEN_CONFIG`, the system
    /// locations, or defaults, in that order.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        if let Some(path) = explicit {
            return Self::load_from_path(&path);
        }

        Ok(Self::load_from_path(Path::new(CONFIG_PATH))
            .or_else(|_| Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH)))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            }))
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save default config to path (for init)
    pub fn save_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.server.max_body_bytes, 64 * 1024);
        assert_eq!(config.server.request_timeout_secs, 10);
        assert!(config.server.allowed_origins.is_empty());
        assert_eq!(config.model.path, PathBuf::from("classifier.json"));
        assert_eq!(config.policy.numeric_threshold, 5);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[server]
bind = "0.0.0.0:8000"
allowed_origins = ["http://localhost:3000"]

[model]
path = "/var/lib/pdscreen/classifier.json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(
            config.model.path,
            PathBuf::from("/var/lib/pdscreen/classifier.json")
        );
        // Defaults for missing fields
        assert_eq!(config.server.request_timeout_secs, 10);
        assert_eq!(config.policy.numeric_threshold, 5);
    }

    #[test]
    fn test_empty_sections_use_defaults() {
        let config: Config = toml::from_str("[policy]\n").unwrap();
        assert_eq!(config.policy.numeric_threshold, 5);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let err = Config::load(Some(Path::new("/nonexistent/pdscreen.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pdscreen.toml"));
    }

    #[test]
    fn test_save_default_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::save_default(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.server.bind, "127.0.0.1:5000");
        assert_eq!(loaded.policy.numeric_threshold, 5);
    }
}
