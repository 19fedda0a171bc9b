//! Pretty formatter for terminal output.
//!
//! Cards for studies, dimmed metadata, colored links. Long text is wrapped to
//! the terminal width instead of truncated.

use super::OutputData;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use quarry_core::federated::{SourceError, Study};
use quarry_core::research::{format_authors, format_identifiers};
use quarry_core::settings::Settings;
use quarry_core::{AnalysisResult, ResearchReport, ServerInfo};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::Path;

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

/// Indent for card content (after number)
const CARD_INDENT: usize = 6;

/// Wrapping stops growing past this width.
const MAX_TEXT_WIDTH: usize = 100;

pub fn format_pretty(data: &OutputData<'_>) -> String {
    let width = terminal_width();
    match data {
        OutputData::Report {
            report,
            show_abstracts,
        } => format_report(report, *show_abstracts, width),
        OutputData::Analysis(analysis) => format_analysis(analysis, width),
        OutputData::SourceList(sources) => format_sources(sources),
        OutputData::Settings { path, settings } => format_settings(path, settings),
    }
}

fn format_report(report: &ResearchReport, show_abstracts: bool, width: usize) -> String {
    let mut out = String::new();
    out.push('\n');
    let _ = writeln!(
        out,
        "{} {}",
        "Research Results for:".bold().cyan(),
        report.note_title.yellow()
    );
    let _ = writeln!(out, "{}", report.count_label().dimmed());
    out.push('\n');

    if !report.analysis.trends.is_empty() {
        let _ = writeln!(out, "{}", format_section_header("Research Trends Analysis", None, width));
        out.push('\n');
        for line in wrap(&report.analysis.trends, width, 3) {
            let _ = writeln!(out, "{}", line);
        }
        out.push('\n');
    }

    if !report.analysis.queries.is_empty() {
        let _ = writeln!(out, "{}", format_section_header("Search Queries", None, width));
        out.push('\n');
        for query in &report.analysis.queries {
            let _ = writeln!(out, "   {} {}", "•".dimmed(), query);
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{}",
        format_section_header("Studies", Some(report.studies.len()), width)
    );
    out.push('\n');
    if report.studies.is_empty() {
        let _ = writeln!(
            out,
            "   {}",
            "No research papers found. Try adjusting your note content or search parameters."
                .dimmed()
        );
        out.push('\n');
    }
    for (i, study) in report.studies.iter().enumerate() {
        out.push_str(&format_study_card(study, i + 1, show_abstracts, width));
        out.push('\n');
    }

    if !report.errors.is_empty() {
        out.push_str(&format_source_errors(&report.errors));
    }
    out
}

fn format_study_card(study: &Study, index: usize, show_abstracts: bool, width: usize) -> String {
    let mut out = String::new();
    let badge = format!("[{}]", study.source.as_str().to_uppercase());

    // Line 1: Index + badge + title
    let _ = writeln!(
        out,
        " {:>3}. {} {}",
        index.to_string().cyan().bold(),
        badge.magenta(),
        study.title.bold()
    );

    if !study.url.is_empty() {
        let _ = writeln!(out, "      {}", format_hyperlink(&study.url, &study.url).blue());
    }
    if let Some(authors) = format_authors(&study.authors) {
        let _ = writeln!(out, "      {}", authors.dimmed());
    }
    let _ = writeln!(
        out,
        "      {} {}",
        "Published:".dimmed(),
        study.publish_date.dimmed()
    );
    if let Some(ids) = format_identifiers(study) {
        let _ = writeln!(out, "      {}", ids.dimmed());
    }
    if show_abstracts {
        for line in wrap(&study.abstract_text, width, CARD_INDENT) {
            let _ = writeln!(out, "{}", line.italic());
        }
    }
    out
}

fn format_source_errors(errors: &[SourceError]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} source call(s) failed; results may be incomplete",
        "!".yellow().bold(),
        errors.len()
    );
    for error in errors {
        let _ = writeln!(
            out,
            "   {} {} for '{}': {}",
            "•".dimmed(),
            error.source.display_name().yellow(),
            error.query,
            error.error.dimmed()
        );
    }
    out.push('\n');
    out
}

fn format_analysis(analysis: &AnalysisResult, width: usize) -> String {
    let mut out = String::new();
    out.push('\n');
    for (label, items) in [("Topics", &analysis.topics), ("Search Queries", &analysis.queries)] {
        let _ = writeln!(out, "{}", format_section_header(label, Some(items.len()), width));
        out.push('\n');
        if items.is_empty() {
            let _ = writeln!(out, "   {}", "none".dimmed());
        }
        for (i, item) in items.iter().enumerate() {
            let _ = writeln!(out, " {:>3}. {}", (i + 1).to_string().cyan().bold(), item);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "{}", format_section_header("Research Trends Analysis", None, width));
    out.push('\n');
    for line in wrap(&analysis.trends, width, 3) {
        let _ = writeln!(out, "{}", line);
    }
    out.push('\n');
    out
}

fn format_sources(sources: &[ServerInfo]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Source"), Cell::new("Description")]);
    for source in sources {
        table.add_row(vec![Cell::new(&source.name), Cell::new(&source.description)]);
    }
    format!("{}\n", table)
}

fn format_settings(path: &Path, settings: &Settings) -> String {
    let mut rows = Vec::new();
    if let Ok(value) = serde_json::to_value(settings) {
        flatten("", &value, &mut rows);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Key"), Cell::new("Value")]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }

    format!(
        "\n{} {}\n\n{}\n",
        "Settings file:".bold().cyan(),
        path.display().dimmed(),
        table
    )
}

/// Dotted `key: value` rows for every leaf of a JSON object.
fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if map.is_empty() && !prefix.is_empty() => {
            rows.push((prefix.to_string(), "-".to_string()))
        }
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, rows);
            }
        }
        Value::Null => rows.push((prefix.to_string(), "-".to_string())),
        Value::String(s) => rows.push((prefix.to_string(), truncate_str(s, 60))),
        other => rows.push((prefix.to_string(), other.to_string())),
    }
}

fn format_section_header(label: &str, count: Option<usize>, width: usize) -> String {
    let count_str = match count {
        Some(n) => format!(" ({})", n),
        None => String::new(),
    };

    let header_text = format!("{}{}", label, count_str);
    let line_len = (width.saturating_sub(header_text.len() + 4)).min(60);
    let line = "─".repeat(line_len);

    format!(
        "{} {} {}",
        "──".cyan(),
        header_text.green().bold(),
        line.cyan()
    )
}

fn wrap(text: &str, width: usize, indent: usize) -> Vec<String> {
    // Options width counts the indent
    let line_width = width.min(MAX_TEXT_WIDTH).max(indent + 20);
    let pad = " ".repeat(indent);
    let options = textwrap::Options::new(line_width)
        .initial_indent(&pad)
        .subsequent_indent(&pad);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

fn truncate_str(s: &str, max_len: usize) -> String {
    // Take first line only
    let first_line = s.lines().next().unwrap_or(s);

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Format a URL as a clickable hyperlink using OSC 8 escape sequences.
fn format_hyperlink(url: &str, display_text: &str) -> String {
    // Using \x07 (BEL) as terminator for broader compatibility
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, display_text)
}
