//! Layered configuration: defaults, then `config.toml`, then `CURATOR_*`
//! environment variables (e.g. `CURATOR_API__BASE_URL`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub tui: TuiConfig,
    pub data: DataConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the retrieval backend.
    pub base_url: String,
    /// Bearer token sent with every request, if set.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
}

/// Data directory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            tui: TuiConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7272".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 50 }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/curator/config.toml` and the
    /// environment. Falls back to defaults if anything is unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        Self::extract(
            Figment::from(Serialized::defaults(AppConfig::default()))
                .merge(Toml::file(&config_path))
                .merge(Env::prefixed("CURATOR_").split("__")),
            &config_path,
        )
    }

    /// Load from an explicit file only, without the environment layer.
    pub fn load_from(path: &Path) -> Self {
        Self::extract(
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path)),
            path,
        )
    }

    fn extract(figment: Figment, path: &Path) -> Self {
        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Failed to load config from {}: {e} — using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("curator"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Directory for the rolling log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("curator").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
