//! Session state machine
//!
//! Holds per-image annotation state in list order together with the current
//! position. Every mutation acts on the current image; navigation marks the
//! image being left as rated (or failed) before moving.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::error::SessionError;

use super::compat::check_record;
use super::schema::AnnotationSchema;
use super::types::{CheckState, CheckValue, FileEntry, RatedStatus, Rotation, SessionRecord};

/// In-memory state of one image
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FileState {
    pub(crate) filename: String,
    pub(crate) status: RatedStatus,
    /// Degrees in `0..360`, always a multiple of 90
    pub(crate) rotation: u16,
    pub(crate) notes: String,
    pub(crate) checkboxes: BTreeMap<String, CheckState>,
    pub(crate) ratings: BTreeMap<String, Option<usize>>,
}

impl FileState {
    fn fresh(filename: String, schema: &AnnotationSchema) -> Self {
        Self {
            filename,
            status: RatedStatus::Pending,
            rotation: 0,
            notes: String::new(),
            checkboxes: schema
                .findings
                .iter()
                .map(|f| (f.clone(), CheckState::Unchecked))
                .collect(),
            ratings: schema
                .categories
                .iter()
                .map(|c| (c.title.clone(), None))
                .collect(),
        }
    }

    fn to_entry(&self) -> FileEntry {
        let failed = self.status == RatedStatus::Failed;
        FileEntry {
            filename: self.filename.clone(),
            rated: self.status,
            rotation: i64::from(self.rotation),
            notes: self.notes.clone(),
            checkboxes: self
                .checkboxes
                .iter()
                .map(|(name, state)| {
                    let value = if failed {
                        CheckValue::Fail
                    } else {
                        CheckValue::State(*state)
                    };
                    (name.clone(), value)
                })
                .collect(),
            radiobuttons: self.ratings.clone(),
        }
    }
}

/// Counts of viewed images
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Progress {
    pub(crate) total: usize,
    pub(crate) rated: usize,
    pub(crate) failed: usize,
}

impl Progress {
    pub(crate) fn viewed(&self) -> usize {
        self.rated + self.failed
    }

    pub(crate) fn pending(&self) -> usize {
        self.total - self.viewed()
    }

    pub(crate) fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.viewed() as f64 / self.total as f64
        }
    }
}

/// Result of a navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Moved {
    pub(crate) from: usize,
    pub(crate) to: usize,
    /// Set when `next` found no unrated image left
    pub(crate) all_rated: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) image_directory: PathBuf,
    pub(crate) reference_directory: PathBuf,
    pub(crate) reference_delimiter: String,
    schema: AnnotationSchema,
    files: Vec<FileState>,
    index_of: HashMap<String, usize>,
    current: usize,
}

impl Session {
    pub(crate) fn new(
        image_directory: PathBuf,
        reference_directory: PathBuf,
        reference_delimiter: String,
        filenames: Vec<String>,
        schema: AnnotationSchema,
    ) -> Self {
        let mut files: Vec<FileState> = Vec::with_capacity(filenames.len());
        let mut index_of = HashMap::with_capacity(filenames.len());
        for name in filenames {
            if index_of.contains_key(&name) {
                continue;
            }
            index_of.insert(name.clone(), files.len());
            files.push(FileState::fresh(name, &schema));
        }
        Self {
            image_directory,
            reference_directory,
            reference_delimiter,
            schema,
            files,
            index_of,
            current: 0,
        }
    }

    /// Rebuild a session from its persisted record. Findings and categories
    /// missing from an entry start out unchecked/unset.
    pub(crate) fn from_record(
        record: SessionRecord,
        schema: AnnotationSchema,
    ) -> Result<Self, SessionError> {
        let problems = check_record(&record, &schema);
        if !problems.is_empty() {
            return Err(SessionError::Incompatible(problems));
        }

        let mut files = Vec::with_capacity(record.files.len());
        let mut index_of = HashMap::with_capacity(record.files.len());
        for entry in record.files {
            let mut state = FileState::fresh(entry.filename, &schema);
            state.status = entry.rated;
            state.rotation = entry.rotation.rem_euclid(360) as u16;
            state.notes = entry.notes;
            for (finding, value) in entry.checkboxes {
                // FAIL masks the real state; an image re-rated later starts unchecked
                let checked = match value {
                    CheckValue::State(s) => s,
                    CheckValue::Fail => CheckState::Unchecked,
                };
                state.checkboxes.insert(finding, checked);
            }
            state.ratings.extend(entry.radiobuttons);
            index_of.insert(state.filename.clone(), files.len());
            files.push(state);
        }

        Ok(Self {
            image_directory: record.image_directory,
            reference_directory: record.reference_image_directory,
            reference_delimiter: record.reference_delimiter,
            schema,
            files,
            index_of,
            current: 0,
        })
    }

    pub(crate) fn to_record(&self) -> SessionRecord {
        SessionRecord {
            image_directory: self.image_directory.clone(),
            reference_image_directory: self.reference_directory.clone(),
            reference_delimiter: self.reference_delimiter.clone(),
            files: self.files.iter().map(FileState::to_entry).collect(),
        }
    }

    pub(crate) fn schema(&self) -> &AnnotationSchema {
        &self.schema
    }

    pub(crate) fn files(&self) -> &[FileState] {
        &self.files
    }

    pub(crate) fn len(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub(crate) fn current_index(&self) -> usize {
        self.current
    }

    pub(crate) fn current(&self) -> Option<&FileState> {
        self.files.get(self.current)
    }

    pub(crate) fn index_of(&self, filename: &str) -> Option<usize> {
        self.index_of.get(filename).copied()
    }

    pub(crate) fn progress(&self) -> Progress {
        let mut progress = Progress {
            total: self.files.len(),
            ..Progress::default()
        };
        for file in &self.files {
            match file.status {
                RatedStatus::Rated => progress.rated += 1,
                RatedStatus::Failed => progress.failed += 1,
                RatedStatus::Pending => {}
            }
        }
        progress
    }

    /// Resume at `last_file` when it is still listed, otherwise at
    /// `last_index` clamped to the list.
    pub(crate) fn restore_position(&mut self, last_file: Option<&str>, last_index: Option<usize>) {
        if self.files.is_empty() {
            self.current = 0;
            return;
        }
        if let Some(index) = last_file.and_then(|f| self.index_of(f)) {
            self.current = index;
        } else if let Some(index) = last_index {
            self.current = index.min(self.files.len() - 1);
        }
    }

    fn current_mut(&mut self) -> Result<&mut FileState, SessionError> {
        self.files.get_mut(self.current).ok_or(SessionError::Empty)
    }

    fn mark_current(&mut self, failed: bool) -> Result<usize, SessionError> {
        let from = self.current;
        let file = self.current_mut()?;
        file.status = if failed {
            RatedStatus::Failed
        } else {
            RatedStatus::Rated
        };
        Ok(from)
    }

    /// Mark the current image and move to the next unrated one, wrapping
    /// around. When every image is rated, step forward by one.
    pub(crate) fn next(&mut self, failed: bool) -> Result<Moved, SessionError> {
        let from = self.mark_current(failed)?;
        let len = self.files.len();

        let mut candidate = (from + 1) % len;
        while candidate != from && self.files[candidate].status.is_viewed() {
            candidate = (candidate + 1) % len;
        }

        let moved = if candidate == from {
            Moved {
                from,
                to: (from + 1) % len,
                all_rated: true,
            }
        } else {
            Moved {
                from,
                to: candidate,
                all_rated: false,
            }
        };
        self.current = moved.to;
        tracing::debug!(from = moved.from, to = moved.to, "next image");
        Ok(moved)
    }

    /// Mark the current image and step back one, wrapping to the last image
    pub(crate) fn previous(&mut self) -> Result<Moved, SessionError> {
        let from = self.mark_current(false)?;
        let to = if from == 0 { self.files.len() - 1 } else { from - 1 };
        self.current = to;
        tracing::debug!(from, to, "previous image");
        Ok(Moved {
            from,
            to,
            all_rated: false,
        })
    }

    /// Mark the current image and jump to `index`
    pub(crate) fn go_to(&mut self, index: usize) -> Result<Moved, SessionError> {
        if self.files.is_empty() {
            return Err(SessionError::Empty);
        }
        if index >= self.files.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.files.len(),
            });
        }
        let from = self.mark_current(false)?;
        self.current = index;
        tracing::debug!(from, to = index, "go to image");
        Ok(Moved {
            from,
            to: index,
            all_rated: false,
        })
    }

    pub(crate) fn go_to_file(&mut self, filename: &str) -> Result<Moved, SessionError> {
        if self.files.is_empty() {
            return Err(SessionError::Empty);
        }
        let index = self
            .index_of(filename)
            .ok_or_else(|| SessionError::UnknownFile {
                name: filename.to_string(),
            })?;
        self.go_to(index)
    }

    pub(crate) fn set_checkbox(&mut self, finding: &str, state: CheckState) -> Result<(), SessionError> {
        if !self.schema.has_finding(finding) {
            return Err(SessionError::UnknownFinding {
                name: finding.to_string(),
            });
        }
        if state == CheckState::Uncertain && !self.schema.tristate {
            return Err(SessionError::TristateDisabled {
                finding: finding.to_string(),
            });
        }
        let file = self.current_mut()?;
        file.checkboxes.insert(finding.to_string(), state);
        Ok(())
    }

    /// Select `label` in `category`; returns the stored label index
    pub(crate) fn set_rating(&mut self, category: &str, label: &str) -> Result<usize, SessionError> {
        let group = self
            .schema
            .category(category)
            .ok_or_else(|| SessionError::UnknownCategory {
                name: category.to_string(),
            })?;
        let index = group
            .label_index(label)
            .ok_or_else(|| SessionError::UnknownLabel {
                category: category.to_string(),
                label: label.to_string(),
            })?;
        let file = self.current_mut()?;
        file.ratings.insert(category.to_string(), Some(index));
        Ok(index)
    }

    pub(crate) fn clear_rating(&mut self, category: &str) -> Result<(), SessionError> {
        if self.schema.category(category).is_none() {
            return Err(SessionError::UnknownCategory {
                name: category.to_string(),
            });
        }
        let file = self.current_mut()?;
        file.ratings.insert(category.to_string(), None);
        Ok(())
    }

    pub(crate) fn set_notes(&mut self, notes: &str) -> Result<(), SessionError> {
        let file = self.current_mut()?;
        file.notes = notes.to_string();
        Ok(())
    }

    /// Rotate the current image; right subtracts 90 degrees, left adds 90.
    /// Returns the new rotation.
    pub(crate) fn rotate(&mut self, direction: Rotation) -> Result<u16, SessionError> {
        let file = self.current_mut()?;
        file.rotation = match direction {
            Rotation::Right => (file.rotation + 270) % 360,
            Rotation::Left => (file.rotation + 90) % 360,
        };
        Ok(file.rotation)
    }
}
