use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::suggest::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote document server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Document server URL (e.g., "http://localhost:8080")
    #[serde(default = "RemoteConfig::default_server_url")]
    pub server_url: String,
}

impl RemoteConfig {
    fn default_server_url() -> String {
        "http://localhost:8080".to_string()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            server_url: Self::default_server_url(),
        }
    }
}

/// Generation API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    /// API key; suggestions are disabled when unset
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "SuggestConfig::default_model")]
    pub model: String,
    #[serde(default = "SuggestConfig::default_endpoint")]
    pub endpoint: String,
}

impl SuggestConfig {
    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_endpoint() -> String {
        DEFAULT_ENDPOINT.to_string()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Self::default_model(),
            endpoint: Self::default_endpoint(),
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local trip store
    pub data_dir: ConfigValue<PathBuf>,
    /// App URL that share fragments are appended to
    pub share_base_url: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub remote: RemoteConfig,
    pub suggest: SuggestConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    share_base_url: Option<String>,
    remote: Option<RemoteConfig>,
    suggest: Option<SuggestConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut share_base_url =
            ConfigValue::new(Self::default_share_base_url(), ConfigSource::Default);
        let mut config_file = None;
        let mut remote = RemoteConfig::default();
        let mut suggest = SuggestConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(url) = file_config.share_base_url {
                share_base_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(remote_config) = file_config.remote {
                remote = remote_config;
            }
            if let Some(suggest_config) = file_config.suggest {
                suggest = suggest_config;
            }
        }

        // Apply environment variable overrides
        if let Ok(dir) = std::env::var("ITINERA_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("ITINERA_SHARE_BASE_URL") {
            share_base_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("ITINERA_SERVER_URL") {
            remote.server_url = url;
        }
        if let Ok(key) = std::env::var("ITINERA_API_KEY") {
            suggest.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("ITINERA_SUGGEST_MODEL") {
            suggest.model = model;
        }

        Ok(Self {
            data_dir,
            share_base_url,
            config_file,
            remote,
            suggest,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/itinera/
    /// - macOS: ~/Library/Application Support/itinera/
    /// - Windows: %APPDATA%/itinera/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("itinera")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/itinera/
    /// - macOS: ~/Library/Application Support/itinera/
    /// - Windows: %APPDATA%/itinera/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("itinera")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }

    pub fn default_share_base_url() -> String {
        "http://localhost:5173/".to_string()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
