//! Human-readable output formatter.
//!
//! Uses ariadne for terminal reports with source context; falls back to
//! a plain `file:line:col` line when the source file cannot be read
//! (location-free aggregates always use the plain form).

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::collections::HashMap;

use crate::diagnostic::Diagnostic;

/// Format diagnostics for the terminal.
pub fn format_human(diags: &[Diagnostic], use_color: bool) -> String {
    if diags.is_empty() {
        return "No issues found\n".to_string();
    }

    let mut output = Vec::new();
    let mut source_cache: HashMap<String, String> = HashMap::new();

    let config = Config::default().with_color(use_color);

    for diag in diags {
        let Some(location) = &diag.location else {
            output.push(format!("{diag}\n"));
            continue;
        };

        let file = &location.file;
        let source_text = source_cache
            .entry(file.clone())
            .or_insert_with(|| std::fs::read_to_string(file).unwrap_or_default());

        if source_text.is_empty() {
            output.push(format!("{diag}\n"));
            continue;
        }

        let offset = line_col_to_offset(source_text, location.line, location.column);
        let label_end = (offset + 1).min(source_text.len());

        let mut buf = Vec::new();
        Report::build(ReportKind::Warning, (file.as_str(), offset..label_end))
            .with_config(config)
            .with_code(&diag.code)
            .with_message(&diag.message)
            .with_label(
                Label::new((file.as_str(), offset..label_end))
                    .with_message(&diag.message)
                    .with_color(Color::Yellow),
            )
            .finish()
            .write(
                (file.as_str(), Source::from(source_text.as_str())),
                &mut buf,
            )
            .ok();

        output.push(String::from_utf8_lossy(&buf).to_string());
    }

    output.push(format!("\nFound {} issue(s)\n", diags.len()));
    output.join("\n")
}

/// Convert 1-based line:column to a byte offset in the source text.
fn line_col_to_offset(source: &str, line: u32, col: u32) -> usize {
    let line = line.saturating_sub(1) as usize;
    let col = col.saturating_sub(1) as usize;

    let offset: usize = source
        .lines()
        .take(line)
        .map(|l| l.len() + 1) // +1 for the newline
        .sum();

    (offset + col).min(source.len().saturating_sub(1))
}
