use proptree_common::PathKey;
use proptree_editor::{RenderOptions, SessionOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "proptree.config.json";

/// proptree configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the JSON documents
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,

    /// Show the inferred type next to each value
    #[serde(default)]
    pub show_type_labels: bool,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_refresh_guard_ms")]
    pub refresh_guard_ms: u64,

    #[serde(default = "default_suppression_window_ms")]
    pub suppression_window_ms: u64,

    /// Paths never rendered (e.g. `"internal.cache"`)
    #[serde(default)]
    pub hidden_paths: Vec<String>,
}

fn default_documents_dir() -> String {
    ".".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_refresh_guard_ms() -> u64 {
    100
}

fn default_suppression_window_ms() -> u64 {
    2000
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to the documents directory
    pub fn get_documents_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.documents_dir)
    }

    pub fn session_options(&self) -> anyhow::Result<SessionOptions> {
        let hidden = self
            .hidden_paths
            .iter()
            .map(|p| PathKey::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SessionOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            refresh_guard: Duration::from_millis(self.refresh_guard_ms),
            suppression_window: Duration::from_millis(self.suppression_window_ms),
            render: RenderOptions::default()
                .with_hidden(hidden)
                .with_type_labels(self.show_type_labels),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            show_type_labels: false,
            debounce_ms: default_debounce_ms(),
            refresh_guard_ms: default_refresh_guard_ms(),
            suppression_window_ms: default_suppression_window_ms(),
            hidden_paths: vec![],
        }
    }
}
