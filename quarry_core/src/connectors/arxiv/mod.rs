use crate::error::ConnectorError;
use crate::federated::{Source, Study};
use crate::transport::HttpFetch;
use crate::utils::{last_path_segment, resolve_limit};
use crate::SourceAdapter;
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";

/// Largest page the arXiv export API will serve in one request.
pub const MAX_RESULTS_CAP: u32 = 2000;

// Fields collected while inside one <entry>.
#[derive(Debug, Default)]
struct ArxivEntry {
    id: String,
    title: String,
    summary: String,
    published: String,
    authors: Vec<String>,
    doi: Option<String>,
}

impl ArxivEntry {
    fn into_study(self) -> Study {
        // 2023-01-17T18:58:08Z -> 2023-01-17
        let date = self.published.split('T').next().unwrap_or_default();
        let arxiv_id = last_path_segment(self.id.trim()).to_string();

        Study::new(Source::Arxiv, &self.title, &self.summary)
            .with_authors(self.authors)
            .with_url(self.id.trim())
            .with_publish_date(date)
            .with_arxiv_id(Some(&arxiv_id))
            .with_doi(self.doi.as_deref())
    }
}

pub struct ArxivConnector {
    fetcher: Arc<dyn HttpFetch>,
    base_url: String,
}

impl ArxivConnector {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the connector at a mirror or a local test server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('?').to_string();
        self
    }

    /// `all:` searches every field (title, abstract, authors, comments).
    pub fn build_search_url(&self, query: &str, max_results: u32) -> String {
        format!(
            "{}?search_query=all:{}&start=0&max_results={}",
            self.base_url,
            urlencoding::encode(query),
            resolve_limit(max_results, MAX_RESULTS_CAP)
        )
    }
}

#[async_trait]
impl SourceAdapter for ArxivConnector {
    fn source(&self) -> Source {
        Source::Arxiv
    }

    fn description(&self) -> &'static str {
        "arXiv preprints via the Atom export API"
    }

    async fn fetch(&self, query: &str, max_results: u32) -> Result<Vec<Study>, ConnectorError> {
        if query.trim().is_empty() {
            return Err(ConnectorError::InvalidInput("query cannot be empty".into()));
        }

        let url = self.build_search_url(query, max_results);
        let body = self.fetcher.get_text(&url, &HeaderMap::new()).await?;
        let studies = parse_feed(&body)?;
        debug!(query, count = studies.len(), "arxiv feed parsed");
        Ok(studies)
    }
}

/// Parse an arXiv Atom feed into studies, one per `<entry>`.
pub fn parse_feed(xml: &str) -> Result<Vec<Study>, ConnectorError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut studies = Vec::new();
    let mut current: Option<ArxivEntry> = None;
    let mut current_tag: Option<String> = None;
    let mut in_author = false;
    let mut text = String::new();
    let mut buffer = Vec::new();

    loop {
        match reader.read_event_into(&mut buffer)? {
            Event::Start(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                match tag_name.as_str() {
                    "entry" => {
                        current = Some(ArxivEntry::default());
                        in_author = false;
                    }
                    "author" if current.is_some() => in_author = true,
                    "name" if in_author => {
                        text.clear();
                        current_tag = Some(tag_name);
                    }
                    "id" | "title" | "summary" | "published" | "arxiv:doi"
                        if current.is_some() && !in_author =>
                    {
                        text.clear();
                        current_tag = Some(tag_name);
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if current_tag.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if current_tag.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if tag_name == "entry" {
                    if let Some(entry) = current.take() {
                        studies.push(entry.into_study());
                    }
                    current_tag = None;
                } else if tag_name == "author" {
                    in_author = false;
                } else if current_tag.as_deref() == Some(tag_name.as_str()) {
                    current_tag = None;
                    if let Some(entry) = current.as_mut() {
                        let value = std::mem::take(&mut text);
                        match tag_name.as_str() {
                            "id" => entry.id = value,
                            "title" => entry.title = value,
                            "summary" => entry.summary = value,
                            "published" => entry.published = value,
                            "name" => {
                                let name = value.trim();
                                if !name.is_empty() {
                                    entry.authors.push(name.to_string());
                                }
                            }
                            "arxiv:doi" => entry.doi = Some(value),
                            _ => {}
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buffer.clear();
    }

    Ok(studies)
}
