//! Persisted application settings
//!
//! Remembers the last session, directories and position between runs.
//! Stored as TOML in the application home.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::consts::HOME_ENV;
use crate::error::AppError;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    #[serde(default)]
    pub(crate) json_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) config_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) image_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) reference_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) reference_delimiter: Option<String>,
    #[serde(default)]
    pub(crate) last_file: Option<String>,
    #[serde(default)]
    pub(crate) last_index: Option<usize>,
}

/// Application home: `$SPEEDY_IQA_HOME`, else `<config dir>/speedy-iqa`,
/// else `~/.speedy-iqa`.
pub(crate) fn app_home() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("speedy-iqa");
    }
    dirs::home_dir()
        .map(|home| home.join(".speedy-iqa"))
        .unwrap_or_else(|| PathBuf::from(".speedy-iqa"))
}

impl Settings {
    pub(crate) fn path() -> PathBuf {
        app_home().join("settings.toml")
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub(crate) fn load() -> Self {
        let path = Self::path();
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(settings) => {
                    tracing::debug!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub(crate) fn save(&self) -> Result<(), AppError> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| AppError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string(self).map_err(|e| AppError::Write {
            path: path.clone(),
            source: std::io::Error::other(e),
        })?;
        fs::write(&path, content).map_err(|source| AppError::Write { path, source })
    }

    /// Remember the session file and forget a position that belonged to
    /// another session.
    pub(crate) fn remember_session(&mut self, json_path: PathBuf) {
        if self.json_path.as_ref() != Some(&json_path) {
            self.last_file = None;
            self.last_index = None;
        }
        self.json_path = Some(json_path);
    }

    pub(crate) fn remember_position(&mut self, file: &str, index: usize) {
        self.last_file = Some(file.to_string());
        self.last_index = Some(index);
    }
}
