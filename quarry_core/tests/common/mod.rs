#![allow(dead_code)]

use async_trait::async_trait;
use quarry_core::error::ConnectorError;
use quarry_core::transport::HttpFetch;
use reqwest::header::HeaderMap;
use std::sync::Mutex;
use std::time::Duration;

pub const ARXIV: &str = "http://export.arxiv.org/api/query";
pub const ESEARCH: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
pub const EFETCH: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";
pub const S2: &str = "https://api.semanticscholar.org/graph/v1/paper/search";

enum Reply {
    Body(String),
    Status(u16),
}

struct Route {
    prefix: String,
    reply: Reply,
    delay: Option<Duration>,
}

/// In-memory transport. The first route whose prefix matches the URL answers;
/// anything unrouted is a 404. Every request is recorded.
#[derive(Default)]
pub struct FakeFetcher {
    routes: Vec<Route>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.push(Route {
            prefix: prefix.into(),
            reply: Reply::Body(body.into()),
            delay: None,
        });
        self
    }

    pub fn route_delayed(
        mut self,
        prefix: impl Into<String>,
        body: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.routes.push(Route {
            prefix: prefix.into(),
            reply: Reply::Body(body.into()),
            delay: Some(delay),
        });
        self
    }

    pub fn fail(mut self, prefix: impl Into<String>, status: u16) -> Self {
        self.routes.push(Route {
            prefix: prefix.into(),
            reply: Reply::Status(status),
            delay: None,
        });
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_matching(&self, prefix: &str) -> usize {
        self.urls().iter().filter(|u| u.starts_with(prefix)).count()
    }
}

#[async_trait]
impl HttpFetch for FakeFetcher {
    async fn get_text(&self, url: &str, _headers: &HeaderMap) -> Result<String, ConnectorError> {
        self.requests.lock().unwrap().push(url.to_string());
        let Some(route) = self.routes.iter().find(|r| url.starts_with(&r.prefix)) else {
            return Err(ConnectorError::UpstreamStatus {
                status: 404,
                url: url.to_string(),
            });
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        match &route.reply {
            Reply::Body(body) => Ok(body.clone()),
            Reply::Status(status) => Err(ConnectorError::UpstreamStatus {
                status: *status,
                url: url.to_string(),
            }),
        }
    }
}

pub fn arxiv_prefix(query: &str) -> String {
    format!("{}?search_query=all:{}&", ARXIV, urlencoding::encode(query))
}

pub fn esearch_prefix(query: &str) -> String {
    format!("{}?db=pubmed&term={}&", ESEARCH, urlencoding::encode(query))
}

pub fn efetch_prefix(ids: &[&str]) -> String {
    format!("{}?db=pubmed&id={}&", EFETCH, ids.join(","))
}

pub fn s2_prefix(query: &str) -> String {
    format!("{}?query={}&", S2, urlencoding::encode(query))
}

/// Atom feed with one entry per title.
pub fn arxiv_feed(titles: &[&str]) -> String {
    let entries: String = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            format!(
                "<entry><id>http://arxiv.org/abs/2401.{:05}v1</id>\
                 <published>2024-01-0{}T00:00:00Z</published>\
                 <title>{}</title><summary>Abstract {}</summary>\
                 <author><name>Author {}</name></author></entry>",
                i + 1,
                (i % 9) + 1,
                title,
                i,
                i
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><feed xmlns=\"http://www.w3.org/2005/Atom\">{}</feed>",
        entries
    )
}

pub fn esearch_ids(ids: &[&str]) -> String {
    let list = ids
        .iter()
        .map(|id| format!("\"{}\"", id))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{\"esearchresult\":{{\"count\":\"{}\",\"idlist\":[{}]}}}}", ids.len(), list)
}

/// PubmedArticleSet with one article per (pmid, title); abstract omitted
/// when `with_abstract` is false.
pub fn efetch_articles(articles: &[(&str, &str)], with_abstract: bool) -> String {
    let body: String = articles
        .iter()
        .map(|(pmid, title)| {
            let abstract_xml = if with_abstract {
                format!("<Abstract><AbstractText>About {}.</AbstractText></Abstract>", title)
            } else {
                String::new()
            };
            format!(
                "<PubmedArticle><MedlineCitation><PMID>{}</PMID><Article>\
                 <Journal><JournalIssue><PubDate><Year>2020</Year></PubDate></JournalIssue></Journal>\
                 <ArticleTitle>{}</ArticleTitle>{}</Article></MedlineCitation></PubmedArticle>",
                pmid, title, abstract_xml
            )
        })
        .collect();
    format!("<PubmedArticleSet>{}</PubmedArticleSet>", body)
}

pub fn s2_papers(titles: &[&str]) -> String {
    let data = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            serde_json::json!({
                "paperId": format!("p{}", i),
                "title": title,
                "abstract": format!("Graph abstract {}", i),
                "year": 2019,
                "authors": [{"name": format!("Graph Author {}", i)}],
                "externalIds": {"DOI": format!("10.5555/{}", i)}
            })
        })
        .collect::<Vec<_>>();
    serde_json::json!({ "total": titles.len(), "data": data }).to_string()
}
