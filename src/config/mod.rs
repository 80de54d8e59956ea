use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::DEFAULT_API_BASE;

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the authentication backend (`{api_base}/login` etc.)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Last successfully logged-in username, prefilled into the form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_username: Option<String>,

    /// Show desktop notifications on login/logout
    #[serde(default)]
    pub notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            last_username: None,
            notifications: true,
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("torii");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        // Empty usernames are noise, drop them before writing
        let mut clean = self.clone();
        if clean.last_username.as_ref().is_some_and(|u| u.trim().is_empty()) {
            clean.last_username = None;
        }

        let content = toml::to_string_pretty(&clean)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            api_base: "https://auth.example.com/api".to_string(),
            last_username: Some("demo".to_string()),
            notifications: true,
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.api_base, deserialized.api_base);
        assert_eq!(config.last_username, deserialized.last_username);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.last_username.is_none());
    }
}
