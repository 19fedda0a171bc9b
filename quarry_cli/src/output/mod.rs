use crate::cli::OutputFormat;
use crate::commands::Result;
use indicatif::{ProgressBar, ProgressStyle};
use quarry_core::settings::Settings;
use quarry_core::{AnalysisResult, ResearchReport};
use quarry_core::ServerInfo;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

mod pretty;

/// Everything a command can print.
pub enum OutputData<'a> {
    Report {
        report: &'a ResearchReport,
        show_abstracts: bool,
    },
    Analysis(&'a AnalysisResult),
    SourceList(&'a [ServerInfo]),
    Settings {
        path: &'a Path,
        settings: &'a Settings,
    },
}

pub fn format_output(data: &OutputData<'_>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", to_json(data)?);
        }
        OutputFormat::Yaml => {
            print!("{}", to_yaml(data)?);
        }
        OutputFormat::Markdown => {
            print!("{}", format_markdown(data)?);
        }
        OutputFormat::Pretty => {
            print!("{}", pretty::format_pretty(data));
        }
    }
    Ok(())
}

fn to_json(data: &OutputData<'_>) -> Result<String> {
    Ok(match data {
        OutputData::Report { report, .. } => serde_json::to_string_pretty(report)?,
        OutputData::Analysis(analysis) => serde_json::to_string_pretty(analysis)?,
        OutputData::SourceList(sources) => serde_json::to_string_pretty(sources)?,
        OutputData::Settings { settings, .. } => serde_json::to_string_pretty(settings)?,
    })
}

fn to_yaml(data: &OutputData<'_>) -> Result<String> {
    fn yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_yaml::to_string(value)?)
    }
    match data {
        OutputData::Report { report, .. } => yaml(*report),
        OutputData::Analysis(analysis) => yaml(*analysis),
        OutputData::SourceList(sources) => yaml(*sources),
        OutputData::Settings { settings, .. } => yaml(*settings),
    }
}

fn format_markdown(data: &OutputData<'_>) -> Result<String> {
    let mut md = String::new();
    match data {
        OutputData::Report {
            report,
            show_abstracts,
        } => {
            md.push_str(&report.to_markdown(*show_abstracts));
        }
        OutputData::Analysis(analysis) => {
            md.push_str("## Analysis\n");
            push_markdown_list(&mut md, "Topics", &analysis.topics);
            push_markdown_list(&mut md, "Search Queries", &analysis.queries);
            let _ = writeln!(md, "\n### Research Trends Analysis\n\n{}", analysis.trends);
        }
        OutputData::SourceList(sources) => {
            md.push_str("## Sources\n\n");
            for source in sources.iter() {
                let _ = writeln!(md, "- **{}**: {}", source.name, source.description);
            }
        }
        OutputData::Settings { path, settings } => {
            let _ = writeln!(md, "## Settings\n\n`{}`\n", path.display());
            let _ = writeln!(md, "```yaml\n{}```", serde_yaml::to_string(settings)?);
        }
    }
    Ok(md)
}

fn push_markdown_list(md: &mut String, heading: &str, items: &[String]) {
    let _ = writeln!(md, "\n### {}\n", heading);
    if items.is_empty() {
        md.push_str("_none_\n");
    }
    for item in items {
        let _ = writeln!(md, "- {}", item);
    }
}

/// Spinner on stderr while a long step runs. Hidden for machine-readable
/// formats so nothing interleaves with the payload.
pub fn spinner(format: OutputFormat, message: impl Into<String>) -> ProgressBar {
    if format != OutputFormat::Pretty {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
