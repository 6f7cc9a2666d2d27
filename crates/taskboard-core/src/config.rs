use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_completion_spacing_secs() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Board file used when none is given on the command line.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// Seconds between the completion timestamps of subtasks completed together.
    #[serde(default = "default_completion_spacing_secs")]
    pub completion_spacing_secs: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            completion_spacing_secs: default_completion_spacing_secs(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/taskboard/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("taskboard/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("taskboard\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Reads a config file, returning `None` when it is missing or malformed.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }

    /// Spacing is never zero, otherwise a batch could share one instant.
    pub fn effective_completion_spacing(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.completion_spacing_secs.max(1)))
    }
}
