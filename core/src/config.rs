use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::entry::DEFAULT_PREVIEW_LEN;
use crate::history::MAX_ENTRIES;

const HISTORY_FILE_NAME: &str = ".clipboard_history.txt";
const MIN_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history_path: PathBuf,
    pub max_entries: usize,
    pub poll_interval_ms: u64,
    pub preview_len: usize,
    pub quick_access_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        let history_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(HISTORY_FILE_NAME);

        Self {
            history_path,
            max_entries: MAX_ENTRIES,
            poll_interval_ms: 500,
            preview_len: DEFAULT_PREVIEW_LEN,
            quick_access_count: 5,
        }
    }
}

impl Config {
    /// `<config_dir>/clipring/config.toml`, if the platform has a config dir.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("clipring").join("config.toml"))
    }

    /// Load the user config, writing the defaults out on first run.
    ///
    /// Never fails: a missing config dir, an unreadable file or an invalid
    /// file is reported and the defaults are used for this session.
    pub fn load() -> Self {
        Self::load_or_default(Self::config_path().as_deref())
    }

    fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            warn!("no config directory on this system, using default config");
            return Self::default();
        };

        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("using default config: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("invalid config in {}", path.display()))?;
            Ok(config.sanitized())
        } else {
            let config = Self::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, toml::to_string_pretty(&config)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(config)
        }
    }

    fn sanitized(mut self) -> Self {
        self.max_entries = self.max_entries.max(1);
        self.poll_interval_ms = self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS);
        self.preview_len = self.preview_len.max(3);
        self
    }
}
