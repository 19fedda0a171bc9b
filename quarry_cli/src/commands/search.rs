use crate::cli::Cli;
use crate::commands::{load_settings, CommandError, Result};
use crate::output::{format_output, spinner, OutputData};
use quarry_core::federated::SourceSelection;
use quarry_core::{build_registry, AnalysisResult, FederatedSearch, ResearchReport};
use std::sync::Arc;
use tracing::info;

/// Run queries straight through the federated search, skipping the model.
pub async fn run(
    cli: &Cli,
    queries: &[String],
    source: Option<SourceSelection>,
    limit: Option<u32>,
    show_abstracts: bool,
) -> Result<()> {
    let queries: Vec<String> = queries
        .iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if queries.is_empty() {
        return Err(CommandError::InvalidInput(
            "Missing search query. Usage: quarry search \"<query>\"".to_string(),
        ));
    }

    let settings = load_settings(cli)?;
    let selection = source.unwrap_or(settings.default_source);
    let limit = limit.unwrap_or(settings.max_results);

    let registry = build_registry(&settings)?;
    let search =
        FederatedSearch::new(Arc::new(registry)).with_timeout(settings.search_timeout());

    let progress = spinner(
        cli.output,
        format!("Searching {} for {} quer{}...", selection, queries.len(), plural_y(queries.len())),
    );
    let result = search.search_all_report(&queries, selection, limit).await;
    progress.finish_and_clear();

    info!(
        studies = result.studies.len(),
        failed_calls = result.errors.len(),
        duplicates = result.duplicates_removed,
        duration_ms = result.duration_ms,
        "search finished"
    );

    let report = ResearchReport {
        note_title: queries.join("; "),
        analysis: AnalysisResult {
            topics: Vec::new(),
            queries,
            trends: String::new(),
        },
        studies: result.studies,
        errors: result.errors,
    };
    format_output(
        &OutputData::Report {
            report: &report,
            show_abstracts,
        },
        cli.output,
    )
}

fn plural_y(n: usize) -> &'static str {
    if n == 1 {
        "y"
    } else {
        "ies"
    }
}
