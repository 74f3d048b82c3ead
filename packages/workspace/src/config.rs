use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use rulepad_storage::{FileStore, KeyValueStore, MemoryStore};
use serde::{Deserialize, Serialize};

use crate::logging::DEFAULT_LOG_FILTER;

pub const DEFAULT_CONFIG_NAME: &str = "rulepad.config.json";

/// Rulepad panel configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    /// Quiet period before validation, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Document store file, relative to the config directory.
    /// Documents live in memory only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,

    /// `tracing` filter directives, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// How long notices such as "Save successful" stay up, in milliseconds
    #[serde(default = "default_notice_ms")]
    pub notice_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_notice_ms() -> u64 {
    2000
}

impl PanelConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: PanelConfig = serde_json::from_str(&content)
                .with_context(|| format!("Invalid config file {}", config_path.display()))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(PanelConfig::default())
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }

    /// Absolute path to the store file, if one is configured
    pub fn resolve_store_path(&self, dir: impl AsRef<Path>) -> Option<PathBuf> {
        self.store_path
            .as_ref()
            .map(|store_path| dir.as_ref().join(store_path))
    }

    /// Open the configured document store
    pub fn open_store(&self, dir: impl AsRef<Path>) -> anyhow::Result<Box<dyn KeyValueStore>> {
        match self.resolve_store_path(dir) {
            Some(path) => {
                let store = FileStore::open(&path)
                    .with_context(|| format!("Failed to open store {}", path.display()))?;
                Ok(Box::new(store))
            }
            None => Ok(Box::new(MemoryStore::new())),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            store_path: None,
            log_filter: default_log_filter(),
            notice_ms: default_notice_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "debounceMs": 250,
            "storePath": "data/documents.json",
            "logFilter": "rulepad_editor=debug"
        }"#;

        let config: PanelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.store_path.as_deref(), Some("data/documents.json"));
        assert_eq!(config.log_filter, "rulepad_editor=debug");
        assert_eq!(config.notice_ms, 2000);
    }

    #[test]
    fn test_default_config() {
        let config = PanelConfig::default();
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.store_path, None);
        assert_eq!(config.log_filter, "rulepad=info");
        assert_eq!(config.notice_duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = PanelConfig::load(dir.path()).unwrap();
        assert_eq!(config, PanelConfig::default());
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ nope").unwrap();

        let err = PanelConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_store_path_is_relative_to_config_dir() {
        let dir = TempDir::new().unwrap();
        let config = PanelConfig {
            store_path: Some("store.json".into()),
            ..Default::default()
        };

        assert_eq!(
            config.resolve_store_path(dir.path()),
            Some(dir.path().join("store.json"))
        );
        assert!(config.open_store(dir.path()).is_ok());
    }
}
