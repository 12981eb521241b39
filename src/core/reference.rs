//! Locating the reference image that belongs to an assessment image

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub(crate) struct ReferenceResolver<'a> {
    directory: &'a Path,
    delimiter: &'a str,
}

impl<'a> ReferenceResolver<'a> {
    pub(crate) fn new(directory: &'a Path, delimiter: &'a str) -> Self {
        Self {
            directory,
            delimiter,
        }
    }

    /// Reference name for `filename`: the part before the first delimiter, or
    /// the file stem when no delimiter is configured.
    fn reference_name(&self, filename: &str) -> String {
        if !self.delimiter.is_empty() {
            return filename
                .split(self.delimiter)
                .next()
                .unwrap_or(filename)
                .to_string();
        }
        Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string())
    }

    /// Expected reference path. The image's extension is appended when the
    /// reference name lacks it and such a file exists.
    pub(crate) fn resolve(&self, filename: &str) -> PathBuf {
        let mut name = self.reference_name(filename);
        let extension = Path::new(filename)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        if !extension.is_empty() && !name.ends_with(&extension) {
            let with_ext = format!("{name}{extension}");
            if self.directory.join(&with_ext).is_file() {
                name = with_ext;
            }
        }
        self.directory.join(name)
    }

    pub(crate) fn exists(&self, filename: &str) -> bool {
        self.resolve(filename).is_file()
    }
}

/// Assessment images without a reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MissingReferences {
    pub(crate) files: Vec<String>,
    /// Distinct basenames among all images
    pub(crate) unique_expected: usize,
    /// Distinct basenames among the images without a reference
    pub(crate) unique_missing: usize,
}

impl MissingReferences {
    pub(crate) fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub(crate) fn missing_references<'f>(
    resolver: &ReferenceResolver<'_>,
    files: impl IntoIterator<Item = &'f str>,
) -> MissingReferences {
    let mut expected = BTreeSet::new();
    let mut missing_names = BTreeSet::new();
    let mut missing = Vec::new();
    for file in files {
        let base = basename(file);
        expected.insert(base.clone());
        if !resolver.exists(file) {
            missing_names.insert(base);
            missing.push(file.to_string());
        }
    }
    MissingReferences {
        files: missing,
        unique_expected: expected.len(),
        unique_missing: missing_names.len(),
    }
}

fn basename(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}
