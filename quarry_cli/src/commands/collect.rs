use crate::cli::Cli;
use crate::commands::{load_settings, read_input, CommandError, Result};
use crate::output::{format_output, spinner, OutputData};
use owo_colors::OwoColorize;
use quarry_core::federated::SourceSelection;
use quarry_core::llm::{build_backend, BackendKind};
use quarry_core::{build_registry, FederatedSearch, ResearchCollector};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct CollectArgs<'a> {
    pub note: &'a Path,
    pub title: Option<&'a str>,
    pub source: Option<SourceSelection>,
    pub limit: Option<u32>,
    pub backend: Option<BackendKind>,
    pub show_abstracts: bool,
    pub append: bool,
}

/// Analyse a note and search for papers.
pub async fn run(cli: &Cli, args: CollectArgs<'_>) -> Result<()> {
    if args.append && is_stdin(args.note) {
        return Err(CommandError::InvalidInput(
            "--append needs a note file, not stdin".to_string(),
        ));
    }

    let mut settings = load_settings(cli)?;
    if let Some(backend) = args.backend {
        settings.llm.backend = backend;
    }
    let selection = args.source.unwrap_or(settings.default_source);
    let limit = args.limit.unwrap_or(settings.max_results);

    let note = read_input(args.note)?;
    let title = args
        .title
        .map(str::to_string)
        .unwrap_or_else(|| note_title(args.note));

    let backend = build_backend(&settings.llm)?;
    let registry = build_registry(&settings)?;
    let search =
        FederatedSearch::new(Arc::new(registry)).with_timeout(settings.search_timeout());
    let collector =
        ResearchCollector::new(backend, search).with_prompt_template(&settings.prompt_template);

    info!(
        note = %title,
        backend = %settings.llm.backend,
        source = %selection,
        limit,
        "collecting research"
    );
    let progress = spinner(
        cli.output,
        format!("Analysing '{}' and searching {}...", title, selection),
    );
    let result = collector.collect(&title, &note, selection, limit).await;
    progress.finish_and_clear();
    let report = result?;

    format_output(
        &OutputData::Report {
            report: &report,
            show_abstracts: args.show_abstracts,
        },
        cli.output,
    )?;

    if args.append {
        append_to_note(args.note, &report.to_markdown(args.show_abstracts))?;
        eprintln!(
            "{} Appended results to {}",
            "✓".green(),
            args.note.display().cyan()
        );
    }
    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// File stem of the note, or "Untitled" for stdin.
fn note_title(path: &Path) -> String {
    if is_stdin(path) {
        return "Untitled".to_string();
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Append `markdown` after a blank line, the way a note editor inserts at the end.
fn append_to_note(path: &Path, markdown: &str) -> Result<()> {
    let existing = std::fs::read_to_string(path)?;
    let separator = if existing.is_empty() || existing.ends_with("\n\n") {
        ""
    } else if existing.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
    write!(file, "{}{}", separator, markdown)?;
    Ok(())
}
