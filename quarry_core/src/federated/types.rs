//! Core types for federated search results.

use crate::utils::{collapse_whitespace, non_blank};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel title for records the upstream returned without one.
pub const NO_TITLE: &str = "No title";

/// Sentinel abstract for records the upstream returned without one.
pub const NO_ABSTRACT: &str = "No abstract available";

/// Sentinel publication date.
pub const UNKNOWN_DATE: &str = "Unknown";

/// One of the bibliographic providers.
///
/// The declaration order is the fixed concatenation order used when every
/// source is searched for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "arxiv")]
    Arxiv,
    #[serde(rename = "pubmed")]
    Pubmed,
    #[serde(rename = "semantic-scholar", alias = "semantic_scholar")]
    SemanticScholar,
}

impl Source {
    /// All sources in fan-out order.
    pub const ALL: [Source; 3] = [Source::Arxiv, Source::Pubmed, Source::SemanticScholar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Arxiv => "arxiv",
            Source::Pubmed => "pubmed",
            Source::SemanticScholar => "semantic-scholar",
        }
    }

    /// Human-facing provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Arxiv => "arXiv",
            Source::Pubmed => "PubMed",
            Source::SemanticScholar => "Semantic Scholar",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arxiv" => Ok(Source::Arxiv),
            "pubmed" => Ok(Source::Pubmed),
            "semantic-scholar" | "semantic_scholar" | "semanticscholar" => {
                Ok(Source::SemanticScholar)
            }
            other => Err(format!(
                "unknown source '{}' (expected arxiv, pubmed or semantic-scholar)",
                other
            )),
        }
    }
}

/// Which sources a search invocation should hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceSelection {
    All,
    Single(Source),
}

impl Default for SourceSelection {
    fn default() -> Self {
        SourceSelection::Single(Source::Arxiv)
    }
}

impl SourceSelection {
    /// The sources this selection expands to, in fan-out order.
    pub fn sources(&self) -> Vec<Source> {
        match self {
            SourceSelection::All => Source::ALL.to_vec(),
            SourceSelection::Single(source) => vec![*source],
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SourceSelection::All)
    }
}

impl fmt::Display for SourceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelection::All => f.write_str("all"),
            SourceSelection::Single(source) => source.fmt(f),
        }
    }
}

impl FromStr for SourceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(SourceSelection::All);
        }
        s.parse::<Source>().map(SourceSelection::Single)
    }
}

impl TryFrom<String> for SourceSelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceSelection> for String {
    fn from(value: SourceSelection) -> Self {
        value.to_string()
    }
}

/// A normalized bibliographic record from any source.
///
/// Built through [`Study::new`], which collapses whitespace and substitutes
/// the sentinel title/abstract, so neither is ever empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub title: String,

    pub authors: Vec<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: String,

    pub url: String,

    /// `YYYY`, `YYYY-MM-DD`, or `Unknown`
    pub publish_date: String,

    pub source: Source,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// arXiv identifier (e.g. `2301.07041v1`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,

    /// PubMed identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
}

impl Study {
    pub fn new(source: Source, title: &str, abstract_text: &str) -> Self {
        let title = collapse_whitespace(title);
        let abstract_text = collapse_whitespace(abstract_text);
        Self {
            title: if title.is_empty() {
                NO_TITLE.to_string()
            } else {
                title
            },
            authors: Vec::new(),
            abstract_text: if abstract_text.is_empty() {
                NO_ABSTRACT.to_string()
            } else {
                abstract_text
            },
            url: String::new(),
            publish_date: UNKNOWN_DATE.to_string(),
            source,
            doi: None,
            arxiv_id: None,
            pmid: None,
        }
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Blank dates keep the `Unknown` sentinel.
    pub fn with_publish_date(mut self, date: &str) -> Self {
        let date = date.trim();
        if !date.is_empty() {
            self.publish_date = date.to_string();
        }
        self
    }

    pub fn with_doi(mut self, doi: Option<&str>) -> Self {
        self.doi = non_blank(doi);
        self
    }

    pub fn with_arxiv_id(mut self, arxiv_id: Option<&str>) -> Self {
        self.arxiv_id = non_blank(arxiv_id);
        self
    }

    pub fn with_pmid(mut self, pmid: Option<&str>) -> Self {
        self.pmid = non_blank(pmid);
        self
    }

    /// Key used for cross-source deduplication.
    pub fn normalized_title(&self) -> String {
        self.title.to_lowercase()
    }
}

/// Error from a source that failed during a federated search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceError {
    pub source: Source,

    /// Query that was being searched
    pub query: String,

    /// Error message
    pub error: String,

    #[serde(default)]
    pub is_timeout: bool,
}

/// Complete output of a federated search, including diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FederatedSearchResult {
    /// Deduplicated studies in processing order
    pub studies: Vec<Study>,

    /// Source calls that failed or timed out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SourceError>,

    /// Number of source calls that returned successfully
    pub completed_calls: usize,

    /// Studies dropped as duplicates
    pub duplicates_removed: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl FederatedSearchResult {
    /// Whether at least one source call failed.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_sentinels() {
        let study = Study::new(Source::Pubmed, "  ", "");
        assert_eq!(study.title, NO_TITLE);
        assert_eq!(study.abstract_text, NO_ABSTRACT);
        assert_eq!(study.publish_date, UNKNOWN_DATE);
    }

    #[test]
    fn test_study_collapses_whitespace() {
        let study = Study::new(Source::Arxiv, "Graph\n  Neural\tNets", " An   abstract ");
        assert_eq!(study.title, "Graph Neural Nets");
        assert_eq!(study.abstract_text, "An abstract");
    }

    #[test]
    fn test_blank_identifiers_are_absent() {
        let study = Study::new(Source::SemanticScholar, "T", "A")
            .with_doi(Some(""))
            .with_arxiv_id(Some("2301.07041"))
            .with_pmid(None)
            .with_publish_date("");
        assert_eq!(study.doi, None);
        assert_eq!(study.arxiv_id.as_deref(), Some("2301.07041"));
        assert_eq!(study.pmid, None);
        assert_eq!(study.publish_date, UNKNOWN_DATE);
    }

    #[test]
    fn test_study_json_shape() {
        let study = Study::new(Source::SemanticScholar, "Title", "Abs")
            .with_url("https://example.org")
            .with_publish_date("2021")
            .with_arxiv_id(Some("2101.00001"));
        let value = serde_json::to_value(&study).unwrap();
        assert_eq!(value["source"], "semantic-scholar");
        assert_eq!(value["abstract"], "Abs");
        assert_eq!(value["publishDate"], "2021");
        assert_eq!(value["arxivId"], "2101.00001");
        assert!(value.get("doi").is_none());
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!("arxiv".parse::<Source>().unwrap(), Source::Arxiv);
        assert_eq!("PubMed".parse::<Source>().unwrap(), Source::Pubmed);
        assert_eq!(
            "semantic_scholar".parse::<Source>().unwrap(),
            Source::SemanticScholar
        );
        assert!("scopus".parse::<Source>().is_err());
    }

    #[test]
    fn test_selection_parsing_and_expansion() {
        let all: SourceSelection = "all".parse().unwrap();
        assert_eq!(all.sources(), Source::ALL.to_vec());

        let single: SourceSelection = "pubmed".parse().unwrap();
        assert_eq!(single, SourceSelection::Single(Source::Pubmed));
        assert_eq!(single.sources(), vec![Source::Pubmed]);

        assert_eq!(SourceSelection::default().sources(), vec![Source::Arxiv]);
    }

    #[test]
    fn test_selection_yaml_roundtrip() {
        let yaml = serde_yaml::to_string(&SourceSelection::Single(Source::SemanticScholar)).unwrap();
        assert!(yaml.contains("semantic-scholar"));
        let parsed: SourceSelection = serde_yaml::from_str("all").unwrap();
        assert!(parsed.is_all());
    }
}
