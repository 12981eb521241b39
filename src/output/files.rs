use comfy_table::{Cell, Color};
use std::path::Path;

use crate::consts::BLANK;
use crate::core::{FileState, RatedStatus, Session};
use crate::output::format::{
    header_cell, new_table, right_cell, status_cell, styled_cell, truncate,
};

const NOTES_WIDTH: usize = 40;

fn selected<'a>(session: &'a Session, pending_only: bool) -> Vec<(usize, &'a FileState)> {
    session
        .files()
        .iter()
        .enumerate()
        .filter(|(_, f)| !pending_only || f.status == RatedStatus::Pending)
        .collect()
}

pub(crate) fn print_file_table(session: &Session, pending_only: bool, use_color: bool) {
    let rows = selected(session, pending_only);
    if rows.is_empty() {
        println!("No images to list.");
        return;
    }

    let mut table = new_table();
    table.set_header(vec![
        header_cell("#", use_color),
        header_cell("File", use_color),
        header_cell("Status", use_color),
        header_cell("Rotation", use_color),
        header_cell("Notes", use_color),
    ]);

    let current = session.current_index();
    for (index, file) in rows {
        let marker = if index == current { "▶ " } else { "" };
        table.add_row(vec![
            right_cell(&(index + 1).to_string(), None, false),
            styled_cell(
                &format!("{marker}{}", file.filename),
                (use_color && index == current).then_some(Color::Cyan),
                index == current,
            ),
            status_cell(file.status, use_color),
            right_cell(&format!("{}°", file.rotation), None, false),
            Cell::new(truncate(&file.notes, NOTES_WIDTH)),
        ]);
    }

    println!("{table}");
    let progress = session.progress();
    println!(
        "\n  {}/{} viewed ({} failed)\n",
        progress.viewed(),
        progress.total,
        progress.failed
    );
}

pub(crate) fn output_files_json(session: &Session, pending_only: bool) -> String {
    let current = session.current_index();
    let rows: Vec<serde_json::Value> = selected(session, pending_only)
        .into_iter()
        .map(|(index, file)| {
            serde_json::json!({
                "index": index,
                "filename": file.filename,
                "rated": file.status,
                "rotation": file.rotation,
                "notes": file.notes,
                "current": index == current,
            })
        })
        .collect();
    serde_json::to_string_pretty(&rows).unwrap_or_default()
}

/// Rating label for display, `Blank` when unset
fn rating_text(session: &Session, file: &FileState, title: &str) -> String {
    file.ratings
        .get(title)
        .copied()
        .flatten()
        .and_then(|i| session.schema().category(title).and_then(|c| c.label(i)))
        .unwrap_or(BLANK)
        .to_string()
}

pub(crate) fn print_file_detail(
    session: &Session,
    index: usize,
    reference: &Path,
    reference_exists: bool,
    use_color: bool,
) {
    let Some(file) = session.files().get(index) else {
        return;
    };
    let schema = session.schema();

    let mut table = new_table();
    table.set_header(vec![
        header_cell(&format!("Image {}/{}", index + 1, session.len()), use_color),
        header_cell(&file.filename, use_color),
    ]);
    table.add_row(vec![Cell::new("Status"), status_cell(file.status, use_color)]);
    table.add_row(vec![
        Cell::new("Image path"),
        Cell::new(session.image_directory.join(&file.filename).display().to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Reference"),
        styled_cell(
            &format!(
                "{}{}",
                reference.display(),
                if reference_exists { "" } else { " (missing)" }
            ),
            (use_color && !reference_exists).then_some(Color::Red),
            false,
        ),
    ]);
    table.add_row(vec![Cell::new("Rotation"), Cell::new(format!("{}°", file.rotation))]);
    table.add_row(vec![Cell::new("Notes"), Cell::new(&file.notes)]);

    for finding in &schema.findings {
        let state = file.checkboxes.get(finding).copied().unwrap_or_default();
        let text = if file.status == RatedStatus::Failed {
            "FAIL".to_string()
        } else {
            state.to_string()
        };
        table.add_row(vec![Cell::new(format!("☐ {finding}")), Cell::new(text)]);
    }
    for category in &schema.categories {
        table.add_row(vec![
            Cell::new(format!("◉ {}", category.title)),
            Cell::new(rating_text(session, file, &category.title)),
        ]);
    }

    println!("{table}");
}

pub(crate) fn output_file_detail_json(
    session: &Session,
    index: usize,
    reference: &Path,
    reference_exists: bool,
) -> String {
    let Some(file) = session.files().get(index) else {
        return "null".to_string();
    };
    let schema = session.schema();
    let checkboxes: serde_json::Map<String, serde_json::Value> = schema
        .findings
        .iter()
        .map(|finding| {
            let state = file.checkboxes.get(finding).copied().unwrap_or_default();
            (finding.clone(), serde_json::json!(state.code()))
        })
        .collect();
    let ratings: serde_json::Map<String, serde_json::Value> = schema
        .categories
        .iter()
        .map(|category| {
            let index = file.ratings.get(&category.title).copied().flatten();
            let label = index.and_then(|i| category.label(i));
            (
                category.title.clone(),
                serde_json::json!({ "index": index, "label": label }),
            )
        })
        .collect();

    let value = serde_json::json!({
        "index": index,
        "filename": file.filename,
        "image_path": session.image_directory.join(&file.filename),
        "reference_path": reference,
        "reference_exists": reference_exists,
        "rated": file.status,
        "rotation": file.rotation,
        "notes": file.notes,
        "checkboxes": checkboxes,
        "radiobuttons": ratings,
    });
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
