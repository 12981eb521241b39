use comfy_table::{Cell, Color};
use std::path::PathBuf;

use crate::core::Progress;
use crate::output::format::{format_percent, header_cell, new_table, styled_cell};

#[derive(Debug, Clone)]
pub(crate) struct StatusInfo {
    pub(crate) task: String,
    pub(crate) session_path: Option<PathBuf>,
    pub(crate) image_directory: PathBuf,
    pub(crate) reference_directory: PathBuf,
    pub(crate) progress: Progress,
    /// Zero-based index and filename of the current image
    pub(crate) current: Option<(usize, String)>,
    pub(crate) backups: usize,
}

pub(crate) fn print_status_table(status: &StatusInfo, use_color: bool) {
    let mut table = new_table();
    table.set_header(vec![header_cell("Session", use_color), header_cell("", use_color)]);

    let progress = &status.progress;
    let percent_color = if !use_color {
        None
    } else if progress.pending() == 0 && progress.total > 0 {
        Some(Color::Green)
    } else {
        Some(Color::Yellow)
    };

    let session = status
        .session_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unsaved)".to_string());
    let current = match &status.current {
        Some((index, name)) => format!("{} ({}/{})", name, index + 1, progress.total),
        None => "-".to_string(),
    };

    table.add_row(vec![Cell::new("Task"), Cell::new(&status.task)]);
    table.add_row(vec![Cell::new("File"), Cell::new(session)]);
    table.add_row(vec![
        Cell::new("Images"),
        Cell::new(status.image_directory.display().to_string()),
    ]);
    table.add_row(vec![
        Cell::new("References"),
        Cell::new(status.reference_directory.display().to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Progress"),
        styled_cell(
            &format!(
                "{}/{} ({})",
                progress.viewed(),
                progress.total,
                format_percent(progress.percent())
            ),
            percent_color,
            true,
        ),
    ]);
    table.add_row(vec![Cell::new("Rated"), Cell::new(progress.rated)]);
    table.add_row(vec![
        Cell::new("Failed"),
        styled_cell(
            &progress.failed.to_string(),
            (use_color && progress.failed > 0).then_some(Color::Red),
            false,
        ),
    ]);
    table.add_row(vec![Cell::new("Pending"), Cell::new(progress.pending())]);
    table.add_row(vec![Cell::new("Current"), Cell::new(current)]);
    table.add_row(vec![Cell::new("Backups"), Cell::new(status.backups)]);

    println!("{table}");
}

pub(crate) fn output_status_json(status: &StatusInfo) -> String {
    let progress = &status.progress;
    let value = serde_json::json!({
        "task": status.task,
        "session": status.session_path,
        "image_directory": status.image_directory,
        "reference_image_directory": status.reference_directory,
        "total": progress.total,
        "rated": progress.rated,
        "failed": progress.failed,
        "pending": progress.pending(),
        "percent": progress.percent(),
        "current_index": status.current.as_ref().map(|(i, _)| i),
        "current_file": status.current.as_ref().map(|(_, name)| name),
        "backups": status.backups,
    });
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
