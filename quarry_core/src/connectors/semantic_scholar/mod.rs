use crate::error::ConnectorError;
use crate::federated::{Source, Study};
use crate::transport::HttpFetch;
use crate::utils::resolve_limit;
use crate::SourceAdapter;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";

/// `/paper/search` page-size ceiling.
pub const MAX_RESULTS_CAP: u32 = 100;

const SEARCH_FIELDS: &str = "title,authors,abstract,url,year,externalIds";

// Every field is optional: the Graph API omits or nulls whatever it lacks.
#[derive(Debug, Deserialize)]
struct PaperSearchResponse {
    #[serde(default)]
    data: Option<Vec<Paper>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paper {
    #[serde(default)]
    paper_id: Option<String>,
    #[serde(default)]
    external_ids: Option<ExternalIds>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstract")]
    abstract_field: Option<String>,
    // Normally an integer; tolerate strings.
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    authors: Option<Vec<Author>>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(default, rename = "DOI")]
    doi: Option<String>,
    #[serde(default, rename = "ArXiv")]
    ar_xiv: Option<String>,
    #[serde(default, rename = "PubMed")]
    pub_med: Option<String>,
}

impl Paper {
    fn year_string(&self) -> String {
        match &self.year {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.trim().to_string(),
            _ => String::new(),
        }
    }

    fn into_study(self) -> Study {
        let year = self.year_string();
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "https://www.semanticscholar.org/paper/{}",
                    self.paper_id.as_deref().unwrap_or_default()
                )
            });
        let authors = self
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let ids = self.external_ids;

        Study::new(
            Source::SemanticScholar,
            self.title.as_deref().unwrap_or_default(),
            self.abstract_field.as_deref().unwrap_or_default(),
        )
        .with_authors(authors)
        .with_url(url)
        .with_publish_date(&year)
        .with_doi(ids.as_ref().and_then(|i| i.doi.as_deref()))
        .with_arxiv_id(ids.as_ref().and_then(|i| i.ar_xiv.as_deref()))
        .with_pmid(ids.as_ref().and_then(|i| i.pub_med.as_deref()))
    }
}

/// Parse a `/paper/search` response body.
pub fn parse_search_response(json: &str) -> Result<Vec<Study>, ConnectorError> {
    let response: PaperSearchResponse = serde_json::from_str(json)?;
    Ok(response
        .data
        .unwrap_or_default()
        .into_iter()
        .map(Paper::into_study)
        .collect())
}

pub struct SemanticScholarConnector {
    fetcher: Arc<dyn HttpFetch>,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholarConnector {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Optional key; without one requests share the public rate limit.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn build_search_url(&self, query: &str, max_results: u32) -> String {
        format!(
            "{}/paper/search?query={}&limit={}&fields={}",
            self.base_url,
            urlencoding::encode(query),
            resolve_limit(max_results, MAX_RESULTS_CAP),
            SEARCH_FIELDS
        )
    }

    fn headers(&self) -> Result<HeaderMap, ConnectorError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self.api_key.as_deref() {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(key.trim())
                    .map_err(|e| ConnectorError::InvalidInput(format!("invalid API key: {}", e)))?,
            );
        }
        Ok(headers)
    }
}

#[async_trait]
impl SourceAdapter for SemanticScholarConnector {
    fn source(&self) -> Source {
        Source::SemanticScholar
    }

    fn description(&self) -> &'static str {
        "Semantic Scholar academic graph paper search"
    }

    async fn fetch(&self, query: &str, max_results: u32) -> Result<Vec<Study>, ConnectorError> {
        if query.trim().is_empty() {
            return Err(ConnectorError::InvalidInput("query cannot be empty".into()));
        }

        let url = self.build_search_url(query, max_results);
        let body = self.fetcher.get_text(&url, &self.headers()?).await?;
        let studies = parse_search_response(&body)?;
        debug!(query, count = studies.len(), "semantic scholar results parsed");
        Ok(studies)
    }
}
