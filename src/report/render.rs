// src/report/render.rs

//! Console rendering of a [`Report`].

use colored::{Color, ColoredString, Colorize};

use super::Report;
use crate::types::{StepStatus, status_label};

const NO_ERROR_MESSAGE: &str = "No error message";

/// Terminal style attached to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub color: Color,
    pub bold: bool,
}

pub fn status_style(status: StepStatus) -> StatusStyle {
    match status {
        StepStatus::Success => StatusStyle {
            color: Color::Green,
            bold: false,
        },
        StepStatus::Failure => StatusStyle {
            color: Color::Red,
            bold: true,
        },
        StepStatus::Skipped => StatusStyle {
            color: Color::Yellow,
            bold: false,
        },
    }
}

fn paint(text: &str, style: StatusStyle) -> ColoredString {
    let painted = text.color(style.color);
    if style.bold { painted.bold() } else { painted }
}

/// Render the summary table and one failure panel per failed step.
pub fn render(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", "=== TEST RESULTS ===".blue().bold()));
    output.push_str("Step results\n");

    let rows: Vec<(&str, &str, String, StepStatus)> = report
        .results
        .iter()
        .map(|r| {
            let elapsed = (report.created_at - r.created_at).num_milliseconds().max(0) as f64 / 1000.0;
            (
                r.title.as_str(),
                status_label(r.status),
                format!("{}s", elapsed.round() as i64),
                r.status,
            )
        })
        .collect();

    let title_w = rows.iter().map(|r| r.0.chars().count()).chain([4]).max().unwrap_or(4);
    let result_w = rows.iter().map(|r| r.1.len()).chain([6]).max().unwrap_or(6);

    output.push_str(&format!(
        "  {:<title_w$} | {:<result_w$} | Finished after\n",
        "Step", "Result"
    ));
    output.push_str(&format!(
        "  {}-+-{}-+-{}\n",
        "-".repeat(title_w),
        "-".repeat(result_w),
        "-".repeat("Finished after".len())
    ));

    for (title, result, elapsed, status) in &rows {
        // Pad before painting; escape codes would throw widths off.
        let style = status_style(*status);
        let title = paint(&format!("{title:<title_w$}"), style);
        let result = paint(&format!("{result:<result_w$}"), style);
        output.push_str(&format!("  {title} | {result} | {elapsed}\n"));
    }

    for failed in report.failed() {
        let header = format!("--- {} failures ---", failed.title.to_lowercase());
        output.push_str(&format!("\n{}\n", header.red().bold()));
        let errors = failed
            .stderr
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NO_ERROR_MESSAGE);
        for line in errors.lines() {
            output.push_str(&format!("  {line}\n"));
        }
    }

    output.push_str(&format!(
        "\nTotal pipeline duration: {} seconds\n",
        report.run_duration().round() as i64
    ));

    output
}
