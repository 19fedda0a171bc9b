//! End-to-end research collection: note -> model analysis -> federated search.

use crate::analysis::{interpret, AnalysisResult};
use crate::federated::{FederatedSearch, SourceError, SourceSelection, Study};
use crate::llm::{AnalysisBackend, AnalysisError};
use crate::prompts::{render_prompt, DEFAULT_PROMPT_TEMPLATE};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

/// Authors shown before collapsing the rest into "et al.".
pub const AUTHORS_SHOWN: usize = 3;

/// Everything produced for one note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchReport {
    pub note_title: String,
    pub analysis: AnalysisResult,
    pub studies: Vec<Study>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SourceError>,
}

impl ResearchReport {
    /// `Found 1 relevant research paper` / `Found 3 relevant research papers`
    pub fn count_label(&self) -> String {
        found_label(self.studies.len())
    }

    /// Render as Markdown suitable for appending to the note.
    pub fn to_markdown(&self, show_abstracts: bool) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "## Research Results for: {}", self.note_title);
        md.push('\n');
        let _ = writeln!(md, "{}", self.count_label());

        if !self.analysis.trends.is_empty() {
            md.push_str("\n### Research Trends Analysis\n\n");
            let _ = writeln!(md, "{}", self.analysis.trends);
        }

        if !self.analysis.queries.is_empty() {
            md.push_str("\n### Search Queries\n\n");
            for query in &self.analysis.queries {
                let _ = writeln!(md, "- {}", query);
            }
        }

        md.push_str("\n### Studies\n\n");
        if self.studies.is_empty() {
            md.push_str(
                "No research papers found. Try adjusting your note content or search parameters.\n",
            );
            return md;
        }

        for (index, study) in self.studies.iter().enumerate() {
            let badge = study.source.as_str().to_uppercase();
            if study.url.is_empty() {
                let _ = writeln!(md, "{}. **[{}]** {}", index + 1, badge, study.title);
            } else {
                let _ = writeln!(
                    md,
                    "{}. **[{}]** [{}]({})",
                    index + 1,
                    badge,
                    study.title,
                    study.url
                );
            }
            if let Some(authors) = format_authors(&study.authors) {
                let _ = writeln!(md, "   - {}", authors);
            }
            let _ = writeln!(md, "   - Published: {}", study.publish_date);
            if let Some(ids) = format_identifiers(study) {
                let _ = writeln!(md, "   - {}", ids);
            }
            if show_abstracts {
                let _ = writeln!(md, "   > {}", study.abstract_text);
            }
        }
        md
    }
}

pub fn found_label(count: usize) -> String {
    format!(
        "Found {} relevant research paper{}",
        count,
        if count == 1 { "" } else { "s" }
    )
}

/// First three authors, then "et al." when there are more. `None` when the
/// list is empty.
pub fn format_authors(authors: &[String]) -> Option<String> {
    if authors.is_empty() {
        return None;
    }
    if authors.len() > AUTHORS_SHOWN {
        Some(format!("{} et al.", authors[..AUTHORS_SHOWN].join(", ")))
    } else {
        Some(authors.join(", "))
    }
}

/// `DOI: … | arXiv: … | PMID: …` for the identifiers present.
pub fn format_identifiers(study: &Study) -> Option<String> {
    let parts: Vec<String> = [
        study.doi.as_ref().map(|v| format!("DOI: {}", v)),
        study.arxiv_id.as_ref().map(|v| format!("arXiv: {}", v)),
        study.pmid.as_ref().map(|v| format!("PMID: {}", v)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// Drives a note through analysis and search.
pub struct ResearchCollector {
    backend: Arc<dyn AnalysisBackend>,
    search: FederatedSearch,
    prompt_template: String,
}

impl ResearchCollector {
    pub fn new(backend: Arc<dyn AnalysisBackend>, search: FederatedSearch) -> Self {
        Self {
            backend,
            search,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }

    pub fn with_prompt_template(mut self, template: &str) -> Self {
        self.prompt_template = template.to_string();
        self
    }

    /// Ask the model about `note` and interpret its answer.
    pub async fn analyze(&self, note: &str) -> Result<AnalysisResult, AnalysisError> {
        if note.trim().is_empty() {
            return Err(AnalysisError::EmptyNote);
        }

        let prompt = render_prompt(&self.prompt_template, note);
        let raw = self.backend.complete(&prompt).await?;
        Ok(interpret(&raw, note))
    }

    /// Full pipeline. Only analysis failures are errors; source failures
    /// are reported in [`ResearchReport::errors`].
    pub async fn collect(
        &self,
        note_title: &str,
        note: &str,
        selection: SourceSelection,
        max_results: u32,
    ) -> Result<ResearchReport, AnalysisError> {
        let analysis = self.analyze(note).await?;
        info!(
            backend = self.backend.name(),
            queries = analysis.queries.len(),
            "note analysed"
        );

        let result = self
            .search
            .search_all_report(&analysis.queries, selection, max_results)
            .await;

        Ok(ResearchReport {
            note_title: note_title.to_string(),
            analysis,
            studies: result.studies,
            errors: result.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federated::Source;

    fn study(title: &str) -> Study {
        Study::new(Source::Arxiv, title, "An abstract.")
    }

    #[test]
    fn test_found_label_pluralization() {
        assert_eq!(found_label(0), "Found 0 relevant research papers");
        assert_eq!(found_label(1), "Found 1 relevant research paper");
        assert_eq!(found_label(2), "Found 2 relevant research papers");
    }

    #[test]
    fn test_format_authors() {
        let names = |n: usize| (1..=n).map(|i| format!("A{}", i)).collect::<Vec<_>>();
        assert_eq!(format_authors(&[]), None);
        assert_eq!(format_authors(&names(3)).unwrap(), "A1, A2, A3");
        assert_eq!(format_authors(&names(5)).unwrap(), "A1, A2, A3 et al.");
    }

    #[test]
    fn test_format_identifiers() {
        let s = study("T")
            .with_doi(Some("10.1/x"))
            .with_pmid(Some("123"));
        assert_eq!(format_identifiers(&s).unwrap(), "DOI: 10.1/x | PMID: 123");
        assert_eq!(format_identifiers(&study("T")), None);
    }

    #[test]
    fn test_markdown_rendering() {
        let report = ResearchReport {
            note_title: "Sleep".into(),
            analysis: AnalysisResult {
                topics: vec!["sleep".into()],
                queries: vec!["sleep memory".into()],
                trends: "Rising.".into(),
            },
            studies: vec![study("Sleep and memory")
                .with_url("http://arxiv.org/abs/1")
                .with_arxiv_id(Some("1"))],
            errors: Vec::new(),
        };
        let md = report.to_markdown(true);
        assert!(md.starts_with("## Research Results for: Sleep\n"));
        assert!(md.contains("Found 1 relevant research paper\n"));
        assert!(md.contains("### Research Trends Analysis\n\nRising.\n"));
        assert!(md.contains("1. **[ARXIV]** [Sleep and memory](http://arxiv.org/abs/1)"));
        assert!(md.contains("   - Published: Unknown"));
        assert!(md.contains("   - arXiv: 1"));
        assert!(md.contains("   > An abstract."));
        assert!(!report.to_markdown(false).contains("> An abstract."));
    }

    #[test]
    fn test_markdown_without_studies() {
        let report = ResearchReport {
            note_title: "Empty".into(),
            analysis: AnalysisResult::default(),
            studies: Vec::new(),
            errors: Vec::new(),
        };
        let md = report.to_markdown(false);
        assert!(md.contains("No research papers found."));
        assert!(!md.contains("Research Trends Analysis"));
    }
}
