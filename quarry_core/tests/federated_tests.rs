mod common;

use common::*;
use quarry_core::federated::{FederatedSearch, Source, SourceSelection, NO_ABSTRACT};
use quarry_core::settings::Settings;
use quarry_core::{build_registry_with_fetcher, SourceAdapter};
use std::sync::Arc;
use std::time::Duration;

fn engine(fetcher: Arc<FakeFetcher>) -> FederatedSearch {
    let registry = build_registry_with_fetcher(&Settings::default(), fetcher);
    FederatedSearch::new(Arc::new(registry)).with_timeout(Duration::from_secs(5))
}

fn titles(studies: &[quarry_core::federated::Study]) -> Vec<String> {
    studies.iter().map(|s| s.title.clone()).collect()
}

#[test]
fn test_registry_has_all_sources_in_fan_out_order() {
    let registry = build_registry_with_fetcher(&Settings::default(), Arc::new(FakeFetcher::new()));
    assert_eq!(registry.sources(), Source::ALL.to_vec());
    for source in Source::ALL {
        assert_eq!(registry.get(source).unwrap().source(), source);
    }
}

#[tokio::test]
async fn test_query_order_then_source_order_regardless_of_latency() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            // q1: arxiv is the slowest source but must still come first
            .route_delayed(arxiv_prefix("q1"), arxiv_feed(&["A-q1"]), Duration::from_millis(150))
            .route(esearch_prefix("q1"), esearch_ids(&["11"]))
            .route(efetch_prefix(&["11"]), efetch_articles(&[("11", "P-q1")], true))
            .route(s2_prefix("q1"), s2_papers(&["S-q1"]))
            .route(arxiv_prefix("q2"), arxiv_feed(&["A-q2"]))
            .route(esearch_prefix("q2"), esearch_ids(&["21"]))
            .route_delayed(
                efetch_prefix(&["21"]),
                efetch_articles(&[("21", "P-q2")], true),
                Duration::from_millis(100),
            )
            .route(s2_prefix("q2"), s2_papers(&["S-q2"])),
    );

    let studies = engine(fetcher)
        .search_all(
            &["q1".to_string(), "q2".to_string()],
            SourceSelection::All,
            10,
        )
        .await;

    assert_eq!(
        titles(&studies),
        vec!["A-q1", "P-q1", "S-q1", "A-q2", "P-q2", "S-q2"]
    );
}

#[tokio::test]
async fn test_failing_pubmed_leaves_other_sources() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .route(arxiv_prefix("sleep"), arxiv_feed(&["Arxiv sleep"]))
            .fail(ESEARCH, 503)
            .route(s2_prefix("sleep"), s2_papers(&["Graph sleep"])),
    );

    let report = engine(fetcher)
        .search_all_report(&["sleep".to_string()], SourceSelection::All, 10)
        .await;

    assert_eq!(titles(&report.studies), vec!["Arxiv sleep", "Graph sleep"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].source, Source::Pubmed);
    assert_eq!(report.errors[0].query, "sleep");
}

#[tokio::test]
async fn test_empty_idlist_issues_no_efetch() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .route(esearch_prefix("obscure"), esearch_ids(&[]))
            .route(EFETCH, efetch_articles(&[("1", "Should not appear")], true)),
    );

    let studies = engine(fetcher.clone())
        .search_all(
            &["obscure".to_string()],
            SourceSelection::Single(Source::Pubmed),
            10,
        )
        .await;

    assert!(studies.is_empty());
    assert_eq!(fetcher.count_matching(ESEARCH), 1);
    assert_eq!(fetcher.count_matching(EFETCH), 0);
}

#[tokio::test]
async fn test_cross_source_duplicate_keeps_arxiv_record() {
    let query = "graph neural networks";
    let fetcher = Arc::new(
        FakeFetcher::new()
            .route(arxiv_prefix(query), arxiv_feed(&["GNN Survey"]))
            .route(esearch_prefix(query), esearch_ids(&[]))
            .route(s2_prefix(query), s2_papers(&["gnn survey"])),
    );

    let report = engine(fetcher)
        .search_all_report(&[query.to_string()], SourceSelection::All, 10)
        .await;

    assert_eq!(report.studies.len(), 1);
    assert_eq!(report.studies[0].title, "GNN Survey");
    assert_eq!(report.studies[0].source, Source::Arxiv);
    assert_eq!(report.duplicates_removed, 1);
}

#[tokio::test]
async fn test_missing_abstract_gets_sentinel() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .route(esearch_prefix("bare"), esearch_ids(&["7"]))
            .route(efetch_prefix(&["7"]), efetch_articles(&[("7", "No abstract here")], false)),
    );

    let studies = engine(fetcher)
        .search_all(&["bare".to_string()], SourceSelection::Single(Source::Pubmed), 10)
        .await;

    assert_eq!(studies.len(), 1);
    assert_eq!(studies[0].abstract_text, NO_ABSTRACT);
    assert_eq!(studies[0].publish_date, "2020");
    assert_eq!(studies[0].url, "https://pubmed.ncbi.nlm.nih.gov/7/");
}

#[tokio::test]
async fn test_dedup_is_idempotent() {
    let fetcher = Arc::new(
        FakeFetcher::new().route(arxiv_prefix("x"), arxiv_feed(&["Dup", "dup", "DUP", "Other"])),
    );
    let studies = engine(fetcher)
        .search_all(&["x".to_string()], SourceSelection::Single(Source::Arxiv), 10)
        .await;
    assert_eq!(titles(&studies), vec!["Dup", "Other"]);

    let again = quarry_core::federated::dedupe_by_title(studies.clone());
    assert_eq!(again, studies);
}

#[tokio::test]
async fn test_limit_is_sent_upstream() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .route(arxiv_prefix("q"), arxiv_feed(&[]))
            .route(esearch_prefix("q"), esearch_ids(&[]))
            .route(s2_prefix("q"), s2_papers(&[])),
    );
    engine(fetcher.clone())
        .search_all(&["q".to_string()], SourceSelection::All, 7)
        .await;

    let urls = fetcher.urls();
    assert!(urls.iter().any(|u| u.starts_with(ARXIV) && u.ends_with("max_results=7")));
    assert!(urls.iter().any(|u| u.starts_with(ESEARCH) && u.contains("&retmax=7&")));
    assert!(urls.iter().any(|u| u.starts_with(S2) && u.contains("&limit=7&")));
}

#[tokio::test]
async fn test_endpoint_overrides_are_honoured() {
    let mut settings = Settings::default();
    settings.endpoints.arxiv = Some("http://mirror.local/api/query".into());

    let fetcher = Arc::new(
        FakeFetcher::new().route("http://mirror.local/api/query?", arxiv_feed(&["Mirrored"])),
    );
    let registry = build_registry_with_fetcher(&settings, fetcher);
    let studies = FederatedSearch::new(Arc::new(registry))
        .search_all(&["q".to_string()], SourceSelection::Single(Source::Arxiv), 1)
        .await;
    assert_eq!(titles(&studies), vec!["Mirrored"]);
}
