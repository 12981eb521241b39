//! Persisted session types
//!
//! These mirror the JSON document written for every annotation session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Whether an image has been assessed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StatusRepr", into = "StatusRepr")]
pub(crate) enum RatedStatus {
    #[default]
    Pending,
    Rated,
    /// The image could not be loaded; stored as the literal "FAILED"
    Failed,
}

impl RatedStatus {
    /// Failed images count as viewed for progress purposes
    pub(crate) fn is_viewed(self) -> bool {
        !matches!(self, RatedStatus::Pending)
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            RatedStatus::Pending => "false",
            RatedStatus::Rated => "true",
            RatedStatus::Failed => "FAILED",
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Flag(bool),
    Text(String),
}

impl TryFrom<StatusRepr> for RatedStatus {
    type Error = String;

    fn try_from(value: StatusRepr) -> Result<Self, Self::Error> {
        match value {
            StatusRepr::Flag(true) => Ok(RatedStatus::Rated),
            StatusRepr::Flag(false) => Ok(RatedStatus::Pending),
            StatusRepr::Text(s) if s == "FAILED" => Ok(RatedStatus::Failed),
            StatusRepr::Text(s) => Err(format!(
                "invalid rated value \"{s}\" (expected true, false or \"FAILED\")"
            )),
        }
    }
}

impl From<RatedStatus> for StatusRepr {
    fn from(value: RatedStatus) -> Self {
        match value {
            RatedStatus::Pending => StatusRepr::Flag(false),
            RatedStatus::Rated => StatusRepr::Flag(true),
            RatedStatus::Failed => StatusRepr::Text("FAILED".to_string()),
        }
    }
}

/// Checkbox state. `Uncertain` is only valid with tri-state checkboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum CheckState {
    #[default]
    Unchecked,
    Uncertain,
    Checked,
}

impl CheckState {
    pub(crate) fn code(self) -> u8 {
        match self {
            CheckState::Unchecked => 0,
            CheckState::Uncertain => 1,
            CheckState::Checked => 2,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CheckState::Unchecked),
            1 => Some(CheckState::Uncertain),
            2 => Some(CheckState::Checked),
            _ => None,
        }
    }

    /// Parse CLI input: a name or a numeric code
    pub(crate) fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "0" | "unchecked" | "no" | "off" => Some(CheckState::Unchecked),
            "1" | "uncertain" | "partial" | "maybe" => Some(CheckState::Uncertain),
            "2" | "checked" | "yes" | "on" => Some(CheckState::Checked),
            _ => None,
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckState::Unchecked => "unchecked",
            CheckState::Uncertain => "uncertain",
            CheckState::Checked => "checked",
        })
    }
}

/// A checkbox value as persisted: a state code or "FAIL" for failed images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CheckRepr", into = "CheckRepr")]
pub(crate) enum CheckValue {
    State(CheckState),
    Fail,
}

impl CheckValue {
    /// Cell text used by CSV export and tables
    pub(crate) fn label(self) -> String {
        match self {
            CheckValue::State(state) => state.code().to_string(),
            CheckValue::Fail => "FAIL".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CheckRepr {
    Flag(bool),
    Code(u8),
    Text(String),
}

impl TryFrom<CheckRepr> for CheckValue {
    type Error = String;

    fn try_from(value: CheckRepr) -> Result<Self, Self::Error> {
        match value {
            CheckRepr::Flag(false) => Ok(CheckValue::State(CheckState::Unchecked)),
            CheckRepr::Flag(true) => Ok(CheckValue::State(CheckState::Checked)),
            CheckRepr::Code(code) => CheckState::from_code(code)
                .map(CheckValue::State)
                .ok_or_else(|| format!("invalid checkbox value {code} (expected 0, 1 or 2)")),
            CheckRepr::Text(s) if s == "FAIL" => Ok(CheckValue::Fail),
            CheckRepr::Text(s) => Err(format!(
                "invalid checkbox value \"{s}\" (expected 0, 1, 2 or \"FAIL\")"
            )),
        }
    }
}

impl From<CheckValue> for CheckRepr {
    fn from(value: CheckValue) -> Self {
        match value {
            CheckValue::State(state) => CheckRepr::Code(state.code()),
            CheckValue::Fail => CheckRepr::Text("FAIL".to_string()),
        }
    }
}

/// One image entry of a session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FileEntry {
    pub(crate) filename: String,
    #[serde(alias = "viewed", default)]
    pub(crate) rated: RatedStatus,
    /// Degrees; validated to a multiple of 90 on load
    #[serde(default)]
    pub(crate) rotation: i64,
    #[serde(default)]
    pub(crate) notes: String,
    #[serde(default)]
    pub(crate) checkboxes: BTreeMap<String, CheckValue>,
    #[serde(default)]
    pub(crate) radiobuttons: BTreeMap<String, Option<usize>>,
}

/// The persisted session document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionRecord {
    pub(crate) image_directory: PathBuf,
    pub(crate) reference_image_directory: PathBuf,
    #[serde(default)]
    pub(crate) reference_delimiter: String,
    pub(crate) files: Vec<FileEntry>,
}

/// Direction of a 90 degree rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rotation {
    Left,
    Right,
}
