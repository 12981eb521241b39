use comfy_table::{Cell, Color};

use crate::consts::BLANK;
use crate::core::{CheckState, Progress, RatedStatus, Session};
use crate::output::format::{format_percent, header_cell, new_table, right_cell, styled_cell};

/// Distribution of one rating category over its labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategorySummary {
    pub(crate) title: String,
    pub(crate) counts: Vec<(String, usize)>,
    pub(crate) blank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FindingSummary {
    pub(crate) name: String,
    pub(crate) checked: usize,
    pub(crate) uncertain: usize,
    pub(crate) failed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Summary {
    pub(crate) progress: Progress,
    pub(crate) categories: Vec<CategorySummary>,
    pub(crate) findings: Vec<FindingSummary>,
}

pub(crate) fn summarize(session: &Session) -> Summary {
    let schema = session.schema();

    let categories = schema
        .categories
        .iter()
        .map(|category| {
            let mut counts = vec![0usize; category.labels.len()];
            let mut blank = 0;
            for file in session.files() {
                match file.ratings.get(&category.title).copied().flatten() {
                    Some(i) if i < counts.len() => counts[i] += 1,
                    _ => blank += 1,
                }
            }
            CategorySummary {
                title: category.title.clone(),
                counts: category.labels.iter().cloned().zip(counts).collect(),
                blank,
            }
        })
        .collect();

    let findings = schema
        .findings
        .iter()
        .map(|name| {
            let mut summary = FindingSummary {
                name: name.clone(),
                checked: 0,
                uncertain: 0,
                failed: 0,
            };
            for file in session.files() {
                if file.status == RatedStatus::Failed {
                    summary.failed += 1;
                    continue;
                }
                match file.checkboxes.get(name) {
                    Some(CheckState::Checked) => summary.checked += 1,
                    Some(CheckState::Uncertain) => summary.uncertain += 1,
                    _ => {}
                }
            }
            summary
        })
        .collect();

    Summary {
        progress: session.progress(),
        categories,
        findings,
    }
}

pub(crate) fn print_summary_table(summary: &Summary, use_color: bool) {
    let total = summary.progress.total;
    println!(
        "\n  {} images, {} viewed ({})\n",
        total,
        summary.progress.viewed(),
        format_percent(summary.progress.percent())
    );

    if !summary.categories.is_empty() {
        let mut table = new_table();
        table.set_header(vec![
            header_cell("Category", use_color),
            header_cell("Label", use_color),
            header_cell("Count", use_color),
            header_cell("Share", use_color),
        ]);
        for category in &summary.categories {
            let rows = category
                .counts
                .iter()
                .map(|(label, n)| (label.as_str(), *n, false))
                .chain(std::iter::once((BLANK, category.blank, true)));
            for (i, (label, count, is_blank)) in rows.enumerate() {
                let share = if total == 0 {
                    0.0
                } else {
                    100.0 * count as f64 / total as f64
                };
                table.add_row(vec![
                    styled_cell(
                        if i == 0 { category.title.as_str() } else { "" },
                        None,
                        i == 0,
                    ),
                    styled_cell(label, (use_color && is_blank).then_some(Color::DarkGrey), false),
                    right_cell(&count.to_string(), None, false),
                    right_cell(&format_percent(share), None, false),
                ]);
            }
        }
        println!("{table}");
    }

    if !summary.findings.is_empty() {
        let mut table = new_table();
        table.set_header(vec![
            header_cell("Finding", use_color),
            header_cell("Checked", use_color),
            header_cell("Uncertain", use_color),
            header_cell("Failed", use_color),
        ]);
        for finding in &summary.findings {
            table.add_row(vec![
                Cell::new(&finding.name),
                right_cell(
                    &finding.checked.to_string(),
                    (use_color && finding.checked > 0).then_some(Color::Green),
                    false,
                ),
                right_cell(&finding.uncertain.to_string(), None, false),
                right_cell(
                    &finding.failed.to_string(),
                    (use_color && finding.failed > 0).then_some(Color::Red),
                    false,
                ),
            ]);
        }
        println!("{table}");
    }
}

pub(crate) fn output_summary_json(summary: &Summary) -> String {
    let categories: Vec<serde_json::Value> = summary
        .categories
        .iter()
        .map(|category| {
            let mut counts = serde_json::Map::new();
            for (label, n) in &category.counts {
                counts.insert(label.clone(), serde_json::json!(n));
            }
            counts.insert(BLANK.to_string(), serde_json::json!(category.blank));
            serde_json::json!({ "title": category.title, "counts": counts })
        })
        .collect();
    let findings: Vec<serde_json::Value> = summary
        .findings
        .iter()
        .map(|f| {
            serde_json::json!({
                "name": f.name,
                "checked": f.checked,
                "uncertain": f.uncertain,
                "failed": f.failed,
            })
        })
        .collect();
    let value = serde_json::json!({
        "total": summary.progress.total,
        "viewed": summary.progress.viewed(),
        "categories": categories,
        "findings": findings,
    });
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
