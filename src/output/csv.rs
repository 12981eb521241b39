use std::fmt::Write;

use crate::core::{CheckState, CheckValue, RatedStatus, Session};
use crate::output::format::{column_name, csv_escape};

/// Flatten a session into one CSV row per image. Findings and categories
/// follow config order; ratings are written as their label text.
pub(crate) fn output_session_csv(session: &Session) -> String {
    let schema = session.schema();
    let mut out = String::new();

    let _ = write!(out, "filename,rated,rotation,notes");
    for finding in &schema.findings {
        let _ = write!(out, ",{}", csv_escape(&column_name(finding)));
    }
    for category in &schema.categories {
        let _ = write!(out, ",{}", csv_escape(&column_name(&category.title)));
    }
    out.push('\n');

    for file in session.files() {
        let _ = write!(
            out,
            "{},{},{},{}",
            csv_escape(&file.filename),
            file.status.label(),
            file.rotation,
            csv_escape(&file.notes),
        );
        for finding in &schema.findings {
            let value = if file.status == RatedStatus::Failed {
                CheckValue::Fail
            } else {
                CheckValue::State(
                    file.checkboxes
                        .get(finding)
                        .copied()
                        .unwrap_or(CheckState::Unchecked),
                )
            };
            let _ = write!(out, ",{}", value.label());
        }
        for category in &schema.categories {
            let label = file
                .ratings
                .get(&category.title)
                .copied()
                .flatten()
                .and_then(|i| category.label(i))
                .unwrap_or("");
            let _ = write!(out, ",{}", csv_escape(label));
        }
        out.push('\n');
    }

    out
}
