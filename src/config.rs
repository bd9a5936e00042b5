// Configuration loading

use crate::jsonl::DEFAULT_COMPACT_THRESHOLD;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const APP_DIR: &str = "taskmanager";
const CONFIG_FILE: &str = "config.yaml";

/// Which preference backend holds the data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Jsonl,
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" => Ok(Backend::Jsonl),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("Unknown backend: {} (expected jsonl or sqlite)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the preference file
    pub data_dir: PathBuf,
    pub backend: Backend,
    /// Journal lines before the JSONL backend compacts itself (0 disables)
    pub compact_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::default(),
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// read if present, otherwise defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(eyre!("Config file not found: {}", path.display()));
                }
                Self::from_file(path)
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = ?path, ?config, "Loaded config");
        Ok(config)
    }
}

/// `<data dir>/taskmanager`, falling back to the current directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

/// `<config dir>/taskmanager/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}
