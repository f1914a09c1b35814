// ABOUTME: Configuration loading for parley.
// ABOUTME: Reads ~/.parley/config.toml, then applies environment and CLI overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "PARLEY_API_URL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub storage: StorageConfig,
}

/// REST API connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Conversations fetched per page.
    pub page_size: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

/// Where the session is persisted between runs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load config from ~/.parley/config.toml, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path, falling back to defaults if it
    /// does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".parley")
    }

    /// Path of the durable session storage file.
    pub fn storage_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("parley"))
            .unwrap_or_else(Self::config_dir)
            .join("storage.json")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` to read variables.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
        {
            self.api.base_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_seconds, 60);
        assert_eq!(config.chat.page_size, 20);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn parse_config_toml() {
        let toml_str = r#"
[api]
base_url = "https://chat.example.com"
timeout_seconds = 15

[chat]
page_size = 50

[storage]
path = "/tmp/parley/storage.json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://chat.example.com");
        assert_eq!(config.api.timeout_seconds, 15);
        assert_eq!(config.chat.page_size, 50);
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/tmp/parley/storage.json")
        );
    }

    #[test]
    fn parse_partial_config_uses_defaults() {
        let toml_str = r#"
[api]
base_url = "http://10.0.0.5:8080"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.api.timeout_seconds, 60);
        assert_eq!(config.chat.page_size, 20);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.chat.page_size, 20);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn env_override_replaces_base_url() {
        let mut config = Config::default();
        config.apply_env_from(|key| {
            (key == API_URL_ENV).then(|| " https://api.example.com ".to_string())
        });
        assert_eq!(config.api.base_url, "https://api.example.com");

        config.apply_env_from(|_| Some("   ".to_string()));
        assert_eq!(config.api.base_url, "https://api.example.com");
    }

    #[test]
    fn storage_path_defaults_to_storage_json() {
        let config = Config::default();
        assert!(config.storage_path().ends_with("storage.json"));
    }
}
