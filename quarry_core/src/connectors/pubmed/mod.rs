mod parse;

pub use parse::{parse_efetch, parse_search_ids};

use crate::error::ConnectorError;
use crate::federated::{Source, Study};
use crate::transport::HttpFetch;
use crate::utils::resolve_limit;
use crate::SourceAdapter;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// esearch `retmax` ceiling.
pub const MAX_RESULTS_CAP: u32 = 10_000;

/// PubMed through NCBI E-utilities: `esearch` for ids, then one `efetch`
/// for the full records.
#[derive(Clone)]
pub struct PubMedConnector {
    fetcher: Arc<dyn HttpFetch>,
    base_url: String,
    email: Option<String>,
}

impl PubMedConnector {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            base_url: DEFAULT_BASE_URL.to_string(),
            email: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Contact address NCBI asks heavy users to send. Blank means none.
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }

    fn email_param(&self) -> String {
        self.email
            .as_deref()
            .map(|e| format!("&email={}", urlencoding::encode(e.trim())))
            .unwrap_or_default()
    }

    pub fn build_search_url(&self, query: &str, max_results: u32) -> String {
        format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmax={}&retmode=json{}",
            self.base_url,
            urlencoding::encode(query),
            resolve_limit(max_results, MAX_RESULTS_CAP),
            self.email_param()
        )
    }

    pub fn build_fetch_url(&self, ids: &[String]) -> String {
        format!(
            "{}/efetch.fcgi?db=pubmed&id={}&retmode=xml{}",
            self.base_url,
            ids.join(","),
            self.email_param()
        )
    }
}

#[async_trait]
impl SourceAdapter for PubMedConnector {
    fn source(&self) -> Source {
        Source::Pubmed
    }

    fn description(&self) -> &'static str {
        "PubMed biomedical literature via NCBI E-utilities"
    }

    async fn fetch(&self, query: &str, max_results: u32) -> Result<Vec<Study>, ConnectorError> {
        if query.trim().is_empty() {
            return Err(ConnectorError::InvalidInput("query cannot be empty".into()));
        }

        let headers = HeaderMap::new();
        let search_body = self
            .fetcher
            .get_text(&self.build_search_url(query, max_results), &headers)
            .await?;
        let ids = parse_search_ids(&search_body)?;

        if ids.is_empty() {
            debug!(query, "pubmed returned no ids");
            return Ok(Vec::new());
        }

        let fetch_body = self
            .fetcher
            .get_text(&self.build_fetch_url(&ids), &headers)
            .await?;
        let studies = parse_efetch(&fetch_body)?;
        debug!(query, ids = ids.len(), count = studies.len(), "pubmed records parsed");
        Ok(studies)
    }
}
