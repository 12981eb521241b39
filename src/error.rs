use std::path::PathBuf;

use thiserror::Error;

use crate::core::Incompatibility;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("No session file given. Pass --session <FILE> or run `speedy-iqa init` first.")]
    NoSession,

    #[error("{} already exists (pass --force to overwrite)", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("No {flag} directory given. Pass --{flag} <DIR>.")]
    MissingDirectory { flag: &'static str },

    #[error("Invalid checkbox state \"{input}\" (expected unchecked, uncertain, checked or 0/1/2)")]
    InvalidCheckState { input: String },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Rating category \"{title}\" is defined more than once")]
    DuplicateCategory { title: String },

    #[error("Rating category \"{title}\" has no labels")]
    EmptyLabels { title: String },

    #[error("Finding \"{name}\" is defined more than once")]
    DuplicateFinding { name: String },

    #[error("max_backups must be at least 1")]
    ZeroBackups,
}

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("Session contains no images")]
    Empty,

    #[error("Position {} is out of range (session has {len} images)", .index + 1)]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Image \"{name}\" is not part of this session")]
    UnknownFile { name: String },

    #[error("Unknown finding \"{name}\"")]
    UnknownFinding { name: String },

    #[error("Unknown rating category \"{name}\"")]
    UnknownCategory { name: String },

    #[error("\"{label}\" is not a label of rating category \"{category}\"")]
    UnknownLabel { category: String, label: String },

    #[error("Finding \"{finding}\" cannot be marked uncertain: tri-state checkboxes are disabled")]
    TristateDisabled { finding: String },

    #[error("{}", format_incompatibilities(.0))]
    Incompatible(Vec<Incompatibility>),
}

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid session JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to list backups in {}: {source}", path.display())]
    ListBackups {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove old backup {}: {source}", path.display())]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn format_incompatibilities(problems: &[Incompatibility]) -> String {
    let mut out = format!(
        "Session is incompatible with the configuration or image directory ({} problem{}):",
        problems.len(),
        if problems.len() == 1 { "" } else { "s" }
    );
    for problem in problems {
        out.push_str("\n  - ");
        out.push_str(&problem.to_string());
    }
    out
}
