//! Federated search execution engine.
//!
//! Fans each query out to the selected sources in parallel, tolerates
//! per-source failures, and consolidates everything into one deduplicated list.

use super::{FederatedSearchResult, Source, SourceError, SourceSelection, Study};
use crate::SourceRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Default time budget for a single source call.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine for executing federated searches across the registered sources.
pub struct FederatedSearch {
    registry: Arc<SourceRegistry>,
    source_timeout: Duration,
}

impl FederatedSearch {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self {
            registry,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    /// Per-source time budget. A source that exceeds it counts as failed.
    pub fn with_timeout(mut self, source_timeout: Duration) -> Self {
        self.source_timeout = source_timeout;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Search every query and return the deduplicated studies.
    ///
    /// Never fails: unreachable or broken sources simply contribute nothing.
    pub async fn search_all(
        &self,
        queries: &[String],
        selection: SourceSelection,
        max_results: u32,
    ) -> Vec<Study> {
        self.search_all_report(queries, selection, max_results)
            .await
            .studies
    }

    /// Like [`search_all`](Self::search_all) but keeps the per-source
    /// diagnostics.
    ///
    /// Queries run one after another; within a query the selected sources run
    /// concurrently and their results are appended in [`Source::ALL`] order.
    pub async fn search_all_report(
        &self,
        queries: &[String],
        selection: SourceSelection,
        max_results: u32,
    ) -> FederatedSearchResult {
        let start = Instant::now();
        let mut result = FederatedSearchResult::default();
        let mut collected = Vec::new();

        for query in queries {
            let outcomes = self.search_query(query, selection, max_results).await;
            for outcome in outcomes {
                match outcome {
                    Ok(studies) => {
                        result.completed_calls += 1;
                        collected.extend(studies);
                    }
                    Err(error) => result.errors.push(error),
                }
            }
        }

        let before = collected.len();
        result.studies = dedupe_by_title(collected);
        result.duplicates_removed = before - result.studies.len();
        result.duration_ms = Some(start.elapsed().as_millis() as u64);

        info!(
            queries = queries.len(),
            selection = %selection,
            studies = result.studies.len(),
            duplicates = result.duplicates_removed,
            failures = result.errors.len(),
            "federated search finished"
        );

        result
    }

    async fn search_query(
        &self,
        query: &str,
        selection: SourceSelection,
        max_results: u32,
    ) -> Vec<Result<Vec<Study>, SourceError>> {
        let futures: Vec<_> = selection
            .sources()
            .into_iter()
            .map(|source| self.search_source(source, query, max_results))
            .collect();

        // join_all preserves input order, so results line up with Source::ALL.
        futures::future::join_all(futures).await
    }

    async fn search_source(
        &self,
        source: Source,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<Study>, SourceError> {
        let Some(adapter) = self.registry.get(source) else {
            warn!(source = %source, "source is not enabled in this build");
            return Err(SourceError {
                source,
                query: query.to_string(),
                error: "source not registered".to_string(),
                is_timeout: false,
            });
        };

        let started = Instant::now();
        match timeout(self.source_timeout, adapter.fetch(query, max_results)).await {
            Ok(Ok(studies)) => {
                debug!(
                    source = %source,
                    query,
                    count = studies.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "source search completed"
                );
                Ok(studies)
            }
            Ok(Err(e)) => {
                warn!(source = %source, query, error = %e, "source search failed");
                Err(SourceError {
                    source,
                    query: query.to_string(),
                    error: e.to_string(),
                    is_timeout: e.is_timeout(),
                })
            }
            Err(_) => {
                let ms = self.source_timeout.as_millis();
                warn!(source = %source, query, timeout_ms = ms as u64, "source search timed out");
                Err(SourceError {
                    source,
                    query: query.to_string(),
                    error: format!("timeout after {}ms", ms),
                    is_timeout: true,
                })
            }
        }
    }
}

/// Keep the first study seen for each case-insensitive title.
///
/// Only the title is compared; two different papers that share a title
/// collapse into whichever was seen first.
pub fn dedupe_by_title(studies: Vec<Study>) -> Vec<Study> {
    let mut seen = HashSet::new();
    studies
        .into_iter()
        .filter(|study| seen.insert(study.normalized_title()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;
    use crate::SourceAdapter;
    use async_trait::async_trait;

    struct StaticAdapter {
        source: Source,
        titles: Vec<&'static str>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl StaticAdapter {
        fn ok(source: Source, titles: Vec<&'static str>) -> Arc<dyn crate::SourceAdapter> {
            Arc::new(Self {
                source,
                titles,
                fail: false,
                delay: None,
            })
        }

        fn failing(source: Source) -> Arc<dyn crate::SourceAdapter> {
            Arc::new(Self {
                source,
                titles: Vec::new(),
                fail: true,
                delay: None,
            })
        }

        fn slow(source: Source, delay: Duration) -> Arc<dyn crate::SourceAdapter> {
            Arc::new(Self {
                source,
                titles: vec!["Too late"],
                fail: false,
                delay: Some(delay),
            })
        }
    }

    #[async_trait]
    impl SourceAdapter for StaticAdapter {
        fn source(&self) -> Source {
            self.source
        }

        fn description(&self) -> &'static str {
            "static test adapter"
        }

        async fn fetch(&self, query: &str, _max_results: u32) -> Result<Vec<Study>, ConnectorError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ConnectorError::UpstreamStatus {
                    status: 503,
                    url: format!("http://{}/{}", self.source, query),
                });
            }
            Ok(self
                .titles
                .iter()
                .map(|t| Study::new(self.source, t, query))
                .collect())
        }
    }

    fn engine(adapters: Vec<Arc<dyn SourceAdapter>>) -> FederatedSearch {
        let mut registry = SourceRegistry::new();
        for adapter in adapters {
            registry.register(adapter);
        }
        FederatedSearch::new(Arc::new(registry))
    }

    fn titles(studies: &[Study]) -> Vec<&str> {
        studies.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_dedupe_keeps_first_case_insensitive() {
        let studies = vec![
            Study::new(Source::Arxiv, "Attention Is All You Need", "first"),
            Study::new(Source::SemanticScholar, "attention is all you need", "second"),
            Study::new(Source::Pubmed, "Other", "third"),
        ];
        let deduped = dedupe_by_title(studies);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].abstract_text, "first");
        assert_eq!(deduped[0].source, Source::Arxiv);
        assert_eq!(deduped[1].title, "Other");
    }

    #[test]
    fn test_dedupe_collapses_distinct_papers_with_same_title() {
        let a = Study::new(Source::Pubmed, "Introduction", "cardiology").with_pmid(Some("1"));
        let b = Study::new(Source::Pubmed, "Introduction", "astronomy").with_pmid(Some("2"));
        let deduped = dedupe_by_title(vec![a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].pmid.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_all_sources_concatenate_in_fixed_order() {
        let engine = engine(vec![
            StaticAdapter::ok(Source::SemanticScholar, vec!["S1"]),
            StaticAdapter::ok(Source::Arxiv, vec!["A1", "A2"]),
            StaticAdapter::ok(Source::Pubmed, vec!["P1"]),
        ]);
        let studies = engine
            .search_all(&["q".to_string()], SourceSelection::All, 10)
            .await;
        assert_eq!(titles(&studies), vec!["A1", "A2", "P1", "S1"]);
    }

    #[tokio::test]
    async fn test_queries_processed_in_order_and_deduped_across_queries() {
        let engine = engine(vec![StaticAdapter::ok(
            Source::Arxiv,
            vec!["Shared", "Unique"],
        )]);
        let queries = vec!["first".to_string(), "second".to_string()];
        let studies = engine
            .search_all(&queries, SourceSelection::Single(Source::Arxiv), 10)
            .await;
        assert_eq!(titles(&studies), vec!["Shared", "Unique"]);
        // first query wins
        assert_eq!(studies[0].abstract_text, "first");
    }

    #[tokio::test]
    async fn test_single_selection_only_invokes_that_source() {
        let engine = engine(vec![
            StaticAdapter::ok(Source::Arxiv, vec!["A"]),
            StaticAdapter::ok(Source::Pubmed, vec!["P"]),
        ]);
        let studies = engine
            .search_all(&["q".to_string()], SourceSelection::Single(Source::Pubmed), 10)
            .await;
        assert_eq!(titles(&studies), vec!["P"]);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_sources() {
        let engine = engine(vec![
            StaticAdapter::ok(Source::Arxiv, vec!["A"]),
            StaticAdapter::failing(Source::Pubmed),
            StaticAdapter::ok(Source::SemanticScholar, vec!["S"]),
        ]);
        let report = engine
            .search_all_report(&["q".to_string()], SourceSelection::All, 10)
            .await;
        assert_eq!(titles(&report.studies), vec!["A", "S"]);
        assert_eq!(report.completed_calls, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].source, Source::Pubmed);
        assert!(!report.errors[0].is_timeout);
        assert!(report.is_partial());
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let engine = engine(vec![
            StaticAdapter::ok(Source::Arxiv, vec!["A"]),
            StaticAdapter::slow(Source::Pubmed, Duration::from_secs(5)),
        ])
        .with_timeout(Duration::from_millis(50));
        let report = engine
            .search_all_report(&["q".to_string()], SourceSelection::All, 10)
            .await;
        assert_eq!(titles(&report.studies), vec!["A"]);
        let pubmed_err = report
            .errors
            .iter()
            .find(|e| e.source == Source::Pubmed)
            .unwrap();
        assert!(pubmed_err.is_timeout);
    }

    #[tokio::test]
    async fn test_unregistered_source_is_reported() {
        let engine = engine(vec![StaticAdapter::ok(Source::Arxiv, vec!["A"])]);
        let report = engine
            .search_all_report(&["q".to_string()], SourceSelection::All, 10)
            .await;
        assert_eq!(titles(&report.studies), vec!["A"]);
        assert_eq!(report.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_query_list_yields_nothing() {
        let engine = engine(vec![StaticAdapter::ok(Source::Arxiv, vec!["A"])]);
        let report = engine
            .search_all_report(&[], SourceSelection::All, 10)
            .await;
        assert!(report.studies.is_empty());
        assert_eq!(report.completed_calls, 0);
        assert!(report.errors.is_empty());
    }
}
