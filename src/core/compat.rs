//! Compatibility checks between a session record, the active config and the
//! image directory.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use super::schema::AnnotationSchema;
use super::types::{CheckState, CheckValue, SessionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum Incompatibility {
    #[error("Finding \"{finding}\" is not defined in the config")]
    UnknownFinding { finding: String },

    #[error("Rating category \"{category}\" is not defined in the config")]
    UnknownCategory { category: String },

    #[error("{filename}: \"{finding}\" is uncertain but tri-state checkboxes are disabled")]
    TristateConflict { filename: String, finding: String },

    #[error("{filename}: rating {index} is out of range for \"{category}\"")]
    LabelOutOfRange {
        filename: String,
        category: String,
        index: usize,
    },

    #[error("{filename}: rotation {rotation} is not a multiple of 90")]
    InvalidRotation { filename: String, rotation: i64 },

    #[error("{filename} appears more than once")]
    DuplicateFile { filename: String },

    #[error("{filename} does not exist in the image directory")]
    MissingImage { filename: String },
}

/// Check a record against the config. Unknown names are reported once each.
pub(crate) fn check_record(record: &SessionRecord, schema: &AnnotationSchema) -> Vec<Incompatibility> {
    let mut problems = Vec::new();
    let mut seen_files = HashSet::new();
    let mut unknown_findings = HashSet::new();
    let mut unknown_categories = HashSet::new();

    for entry in &record.files {
        if !seen_files.insert(entry.filename.as_str()) {
            problems.push(Incompatibility::DuplicateFile {
                filename: entry.filename.clone(),
            });
        }

        if entry.rotation % 90 != 0 {
            problems.push(Incompatibility::InvalidRotation {
                filename: entry.filename.clone(),
                rotation: entry.rotation,
            });
        }

        for (finding, value) in &entry.checkboxes {
            if !schema.has_finding(finding) {
                if unknown_findings.insert(finding.as_str()) {
                    problems.push(Incompatibility::UnknownFinding {
                        finding: finding.clone(),
                    });
                }
                continue;
            }
            if !schema.tristate && *value == CheckValue::State(CheckState::Uncertain) {
                problems.push(Incompatibility::TristateConflict {
                    filename: entry.filename.clone(),
                    finding: finding.clone(),
                });
            }
        }

        for (title, selected) in &entry.radiobuttons {
            let Some(category) = schema.category(title) else {
                if unknown_categories.insert(title.as_str()) {
                    problems.push(Incompatibility::UnknownCategory {
                        category: title.clone(),
                    });
                }
                continue;
            };
            if let Some(index) = *selected
                && index >= category.labels.len()
            {
                problems.push(Incompatibility::LabelOutOfRange {
                    filename: entry.filename.clone(),
                    category: title.clone(),
                    index,
                });
            }
        }
    }

    problems
}

/// Every filename must name an existing file under `image_dir`
pub(crate) fn check_images(record: &SessionRecord, image_dir: &Path) -> Vec<Incompatibility> {
    record
        .files
        .iter()
        .filter(|entry| !image_dir.join(&entry.filename).is_file())
        .map(|entry| Incompatibility::MissingImage {
            filename: entry.filename.clone(),
        })
        .collect()
}

/// Config problems followed by images missing from the record's own image
/// directory. A session is only opened when this is empty.
pub(crate) fn check_compatibility(
    record: &SessionRecord,
    schema: &AnnotationSchema,
) -> Vec<Incompatibility> {
    let mut problems = check_record(record, schema);
    problems.extend(check_images(record, &record.image_directory));
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Category;
    use crate::core::types::{FileEntry, RatedStatus};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;

    fn schema() -> AnnotationSchema {
        AnnotationSchema {
            findings: vec!["Motion".to_string()],
            categories: vec![Category {
                title: "Overall".to_string(),
                labels: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            }],
            tristate: false,
        }
    }

    fn entry(name: &str) -> FileEntry {
        FileEntry {
            filename: name.to_string(),
            rated: RatedStatus::Pending,
            rotation: 0,
            notes: String::new(),
            checkboxes: BTreeMap::new(),
            radiobuttons: BTreeMap::new(),
        }
    }

    fn record(files: Vec<FileEntry>) -> SessionRecord {
        SessionRecord {
            image_directory: PathBuf::from("img"),
            reference_image_directory: PathBuf::from("ref"),
            reference_delimiter: "__".to_string(),
            files,
        }
    }

    #[test]
    fn clean_record_has_no_problems() {
        let mut a = entry("a.png");
        a.checkboxes
            .insert("Motion".to_string(), CheckValue::State(CheckState::Checked));
        a.radiobuttons.insert("Overall".to_string(), Some(3));
        assert!(check_record(&record(vec![a, entry("b.png")]), &schema()).is_empty());
    }

    #[test]
    fn unknown_names_reported_once() {
        let mut a = entry("a.png");
        a.checkboxes
            .insert("Blur".to_string(), CheckValue::State(CheckState::Checked));
        a.radiobuttons.insert("Sharpness".to_string(), None);
        let mut b = entry("b.png");
        b.checkboxes.insert("Blur".to_string(), CheckValue::Fail);
        let problems = check_record(&record(vec![a, b]), &schema());
        assert_eq!(
            problems,
            vec![
                Incompatibility::UnknownFinding {
                    finding: "Blur".to_string()
                },
                Incompatibility::UnknownCategory {
                    category: "Sharpness".to_string()
                },
            ]
        );
    }

    #[test]
    fn uncertain_needs_tristate() {
        let mut a = entry("a.png");
        a.checkboxes
            .insert("Motion".to_string(), CheckValue::State(CheckState::Uncertain));
        let rec = record(vec![a]);
        assert_eq!(check_record(&rec, &schema()).len(), 1);

        let tristate = AnnotationSchema {
            tristate: true,
            ..schema()
        };
        assert!(check_record(&rec, &tristate).is_empty());
    }

    #[test]
    fn rotation_duplicates_and_label_range() {
        let mut a = entry("a.png");
        a.rotation = 45;
        a.radiobuttons.insert("Overall".to_string(), Some(4));
        let problems = check_record(&record(vec![a, entry("a.png")]), &schema());
        assert!(problems.contains(&Incompatibility::InvalidRotation {
            filename: "a.png".to_string(),
            rotation: 45
        }));
        assert!(problems.contains(&Incompatibility::LabelOutOfRange {
            filename: "a.png".to_string(),
            category: "Overall".to_string(),
            index: 4
        }));
        assert!(problems.contains(&Incompatibility::DuplicateFile {
            filename: "a.png".to_string()
        }));
    }

    #[test]
    fn missing_images_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("a.png"), b"x").unwrap();
        let rec = record(vec![entry("sub/a.png"), entry("b.png")]);
        assert_eq!(
            check_images(&rec, dir.path()),
            vec![Incompatibility::MissingImage {
                filename: "b.png".to_string()
            }]
        );
    }

    #[test]
    fn compatibility_covers_config_and_image_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        let mut a = entry("a.png");
        a.checkboxes.insert("Blur".to_string(), CheckValue::Fail);
        let mut rec = record(vec![a, entry("gone.png")]);
        rec.image_directory = dir.path().to_path_buf();
        assert_eq!(
            check_compatibility(&rec, &schema()),
            vec![
                Incompatibility::UnknownFinding {
                    finding: "Blur".to_string()
                },
                Incompatibility::MissingImage {
                    filename: "gone.png".to_string()
                },
            ]
        );

        rec.files.pop();
        rec.files[0].checkboxes.clear();
        assert!(check_compatibility(&rec, &schema()).is_empty());
    }
}
