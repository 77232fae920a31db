// src/config.rs
//! Unified configuration loading: built-in defaults, optional config.yaml
//! overrides per environment, secrets always from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub assistant: AssistantSettings,
    pub scraper: ScraperSettings,
    pub analyzer: AnalyzerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    /// Base URL of the OpenAI-compatible API.
    pub api_base_url: String,
    pub request_timeout_seconds: u64,
    /// Delay between run-status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of status polls before giving up.
    pub max_polls: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Base URL of the JustJoin.it public listing API.
    pub listing_base_url: String,
    /// Public offer page base, used to build source URLs.
    pub offer_page_base_url: String,
    pub request_timeout_seconds: u64,
    /// Offers per listing page request.
    pub page_size: u32,
    /// Offers unseen for this many days are deactivated.
    pub deactivate_after_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Trailing analysis window in days.
    pub window_days: i64,
    /// Locations analyzed by a full run; "all" means no location filter.
    pub locations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: AppConfig,
    production: AppConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/careergpt.db"),
            assistant: AssistantSettings::default(),
            scraper: ScraperSettings::default(),
            analyzer: AnalyzerSettings::default(),
        }
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            request_timeout_seconds: 30,
            poll_interval_ms: 1000,
            max_polls: 60,
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            listing_base_url: "https://api.justjoin.it".to_string(),
            offer_page_base_url: "https://justjoin.it/offers".to_string(),
            request_timeout_seconds: 30,
            page_size: 100,
            deactivate_after_days: 30,
        }
    }
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            window_days: 30,
            locations: [
                "all", "warszawa", "kraków", "wrocław", "gdańsk", "poznań", "katowice",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl AppConfig {
    /// Load configuration for the current environment.
    pub fn load() -> Result<Self> {
        let environment = Self::environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = PathBuf::from(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", CONFIG_FILE))?;
        let file: ConfigFile =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", CONFIG_FILE))?;

        Ok(match environment.as_str() {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn environment() -> String {
        std::env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string())
    }

    /// Ensure the database parent directory exists.
    pub async fn ensure_directories(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = AppConfig::default();
        assert_eq!(config.assistant.max_polls, 60);
        assert_eq!(config.assistant.poll_interval_ms, 1000);
        assert_eq!(config.scraper.page_size, 100);
        assert_eq!(config.scraper.deactivate_after_days, 30);
        assert_eq!(config.analyzer.window_days, 30);
        assert_eq!(config.analyzer.locations[0], "all");
        assert_eq!(config.analyzer.locations.len(), 7);
    }

    #[test]
    fn yaml_sections_override_defaults() {
        let yaml = r#"
local:
  database_path: /tmp/test.db
  analyzer:
    window_days: 7
production:
  database_path: /var/lib/careergpt.db
"#;
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.local.database_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(file.local.analyzer.window_days, 7);
        // Untouched sections keep their defaults.
        assert_eq!(file.local.scraper.page_size, 100);
        assert_eq!(file.production.analyzer.window_days, 30);
    }
}
