//! Annotation config
//!
//! The YAML file that defines which findings and rating categories an
//! assessment uses, plus where backups and logs go.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::app_home;

/// A single radio-button label. YAML configs usually list plain integers
/// (`[1, 2, 3, 4]`) but free text is allowed too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Label {
    Number(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(n) => write!(f, "{n}"),
            Label::Text(s) => f.write_str(s),
        }
    }
}

/// A Likert-style rating category shown as a radio-button group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RatingGroup {
    pub(crate) title: String,
    pub(crate) labels: Vec<Label>,
}

impl RatingGroup {
    fn likert(title: &str) -> Self {
        Self {
            title: title.to_string(),
            labels: (1..=4).map(Label::Number).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AnnotationConfig {
    #[serde(default)]
    pub(crate) checkboxes: Vec<String>,
    #[serde(default = "default_page1")]
    pub(crate) radiobuttons_page1: Vec<RatingGroup>,
    #[serde(default = "default_page2")]
    pub(crate) radiobuttons_page2: Vec<RatingGroup>,
    #[serde(default)]
    pub(crate) tristate_checkboxes: bool,
    #[serde(default = "default_max_backups")]
    pub(crate) max_backups: usize,
    #[serde(default)]
    pub(crate) backup_dir: Option<PathBuf>,
    /// Minutes between automatic backups
    #[serde(default = "default_backup_interval")]
    pub(crate) backup_interval: u64,
    #[serde(default)]
    pub(crate) log_dir: Option<PathBuf>,
    #[serde(default = "default_task")]
    pub(crate) task: String,
}

fn default_page1() -> Vec<RatingGroup> {
    vec![RatingGroup::likert("Overall Quality")]
}

fn default_page2() -> Vec<RatingGroup> {
    vec![
        RatingGroup::likert("Contrast"),
        RatingGroup::likert("Noise"),
        RatingGroup::likert("Artefacts"),
    ]
}

fn default_max_backups() -> usize {
    10
}

fn default_backup_interval() -> u64 {
    5
}

fn default_task() -> String {
    "General use".to_string()
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            checkboxes: Vec::new(),
            radiobuttons_page1: default_page1(),
            radiobuttons_page2: default_page2(),
            tristate_checkboxes: false,
            max_backups: default_max_backups(),
            backup_dir: None,
            backup_interval: default_backup_interval(),
            log_dir: None,
            task: default_task(),
        }
    }
}

/// Where a loaded config came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConfigOrigin {
    File(PathBuf),
    /// The requested file was missing; the default config file was used
    Fallback(PathBuf),
    /// No config file existed; a default one was written here
    Created(PathBuf),
}

impl ConfigOrigin {
    pub(crate) fn path(&self) -> &Path {
        match self {
            ConfigOrigin::File(p) | ConfigOrigin::Fallback(p) | ConfigOrigin::Created(p) => p,
        }
    }
}

impl AnnotationConfig {
    /// Load the config at `path`. Falls back to the default config file in the
    /// application home, creating it when it does not exist yet.
    pub(crate) fn load(path: Option<&Path>) -> Result<(Self, ConfigOrigin), ConfigError> {
        if let Some(path) = path {
            if path.is_file() {
                return Ok((Self::read(path)?, ConfigOrigin::File(path.to_path_buf())));
            }
            tracing::warn!("Could not find config file at {}", path.display());
        }

        let default_path = Self::default_path();
        if default_path.is_file() {
            tracing::info!("Using default config file at {}", default_path.display());
            let config = Self::read(&default_path)?;
            return Ok((config, ConfigOrigin::Fallback(default_path)));
        }

        tracing::info!("Creating a new default config file at {}", default_path.display());
        let config = Self::default();
        config.write(&default_path)?;
        Ok((config, ConfigOrigin::Created(default_path)))
    }

    pub(crate) fn default_path() -> PathBuf {
        app_home().join("config.yml")
    }

    pub(crate) fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_backups == 0 {
            return Err(ConfigError::ZeroBackups);
        }
        let mut findings = HashSet::new();
        for name in &self.checkboxes {
            if !findings.insert(name.as_str()) {
                return Err(ConfigError::DuplicateFinding { name: name.clone() });
            }
        }
        let mut titles = HashSet::new();
        for group in self.rating_groups() {
            if !titles.insert(group.title.as_str()) {
                return Err(ConfigError::DuplicateCategory {
                    title: group.title.clone(),
                });
            }
            if group.labels.is_empty() {
                return Err(ConfigError::EmptyLabels {
                    title: group.title.clone(),
                });
            }
        }
        Ok(())
    }

    /// Rating groups from both pages, page 1 first
    pub(crate) fn rating_groups(&self) -> impl Iterator<Item = &RatingGroup> {
        self.radiobuttons_page1
            .iter()
            .chain(self.radiobuttons_page2.iter())
    }

    pub(crate) fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| app_home().join("backups"))
    }

    pub(crate) fn log_dir(&self) -> PathBuf {
        self.log_dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| app_home().join("logs"))
    }
}

/// Expand a leading `~` to the user's home directory
pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
