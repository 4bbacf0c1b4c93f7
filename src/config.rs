use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// How long a delete stays armed before reverting.
    #[serde(default = "default_delete_confirm_ms")]
    pub delete_confirm_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("startpage")
}

fn default_delete_confirm_ms() -> u64 {
    3000
}

fn default_debounce_ms() -> u64 {
    150
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            delete_confirm_ms: default_delete_confirm_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("startpage").join("config.json"))
    }

    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Missing or unreadable config means defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(settings) => settings,
            Err(e) => {
                warn!("⚠️  Failed to parse config {:?} ({}), using defaults", path, e);
                Self::default()
            }
        }
    }

    pub fn delete_confirm_delay(&self) -> Duration {
        Duration::from_millis(self.delete_confirm_ms)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
