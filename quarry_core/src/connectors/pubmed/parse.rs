//! Parsers for the two E-utilities responses: esearch JSON (id list) and
//! efetch PubmedArticleSet XML (records).

use crate::error::ConnectorError;
use crate::federated::{Source, Study};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use serde::Deserialize;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

#[derive(Debug, Deserialize, Default)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: Option<ESearchResult>,
}

#[derive(Debug, Deserialize, Default)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// PMIDs from an esearch `retmode=json` response. A missing result block or
/// id list yields an empty list.
pub fn parse_search_ids(json: &str) -> Result<Vec<String>, ConnectorError> {
    let response: ESearchResponse = serde_json::from_str(json)?;
    Ok(response
        .esearchresult
        .map(|r| r.idlist)
        .unwrap_or_default()
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Title,
    AbstractSection,
    Pmid,
    LastName,
    ForeName,
    Year,
    MedlineDate,
    Doi,
}

#[derive(Debug, Default)]
struct ArticleBuilder {
    title: String,
    abstract_sections: Vec<String>,
    pmid: Option<String>,
    authors: Vec<String>,
    last_name: Option<String>,
    fore_name: Option<String>,
    year: Option<String>,
    medline_date: Option<String>,
    doi: Option<String>,
}

impl ArticleBuilder {
    fn commit(&mut self, capture: Capture, value: String) {
        let value = value.trim().to_string();
        match capture {
            Capture::Title => self.title = value,
            Capture::AbstractSection => {
                if !value.is_empty() {
                    self.abstract_sections.push(value);
                }
            }
            Capture::Pmid => {
                if self.pmid.is_none() {
                    self.pmid = Some(value);
                }
            }
            Capture::LastName => self.last_name = Some(value),
            Capture::ForeName => self.fore_name = Some(value),
            Capture::Year => {
                if self.year.is_none() {
                    self.year = Some(value);
                }
            }
            Capture::MedlineDate => {
                if self.medline_date.is_none() {
                    self.medline_date = Some(value);
                }
            }
            Capture::Doi => {
                if self.doi.is_none() {
                    self.doi = Some(value);
                }
            }
        }
    }

    // Authors without both name parts (collectives, initials-only) are skipped.
    fn finish_author(&mut self) {
        let last = self.last_name.take().filter(|s| !s.is_empty());
        let fore = self.fore_name.take().filter(|s| !s.is_empty());
        if let (Some(fore), Some(last)) = (fore, last) {
            self.authors.push(format!("{} {}", fore, last));
        }
    }

    fn into_study(self) -> Study {
        let year = self
            .year
            .iter()
            .chain(self.medline_date.iter())
            .find_map(|s| YEAR_RE.captures(s).map(|c| c[1].to_string()))
            .unwrap_or_default();
        let url = self
            .pmid
            .as_deref()
            .map(|pmid| format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid))
            .unwrap_or_default();

        Study::new(Source::Pubmed, &self.title, &self.abstract_sections.join(" "))
            .with_authors(self.authors)
            .with_url(url)
            .with_publish_date(&year)
            .with_pmid(self.pmid.as_deref())
            .with_doi(self.doi.as_deref())
    }
}

/// Parse an efetch `PubmedArticleSet` into studies, one per `PubmedArticle`.
///
/// Text inside inline markup (`<i>`, `<sup>`) is kept, as is every labelled
/// section of a structured abstract. Identifiers under `ReferenceList` belong
/// to cited works and are ignored.
pub fn parse_efetch(xml: &str) -> Result<Vec<Study>, ConnectorError> {
    let mut reader = Reader::from_str(xml);

    let mut studies = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<ArticleBuilder> = None;
    let mut capture: Option<(Capture, usize)> = None;
    let mut text = String::new();
    let mut buffer = Vec::new();

    loop {
        match reader.read_event_into(&mut buffer)? {
            Event::Start(ref e) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if tag_name == "PubmedArticle" {
                    current = Some(ArticleBuilder::default());
                } else if let (Some(article), None) = (current.as_mut(), capture) {
                    let parent = stack.last().map(String::as_str).unwrap_or_default();
                    let in_references = stack.iter().any(|t| t == "ReferenceList");

                    let next = match tag_name.as_str() {
                        "ArticleTitle" if parent == "Article" => Some(Capture::Title),
                        "AbstractText" if parent == "Abstract" => Some(Capture::AbstractSection),
                        "PMID" if parent == "MedlineCitation" => Some(Capture::Pmid),
                        "Author" => {
                            article.last_name = None;
                            article.fore_name = None;
                            None
                        }
                        "LastName" if parent == "Author" => Some(Capture::LastName),
                        "ForeName" if parent == "Author" => Some(Capture::ForeName),
                        "Year" if parent == "PubDate" => Some(Capture::Year),
                        "MedlineDate" if parent == "PubDate" => Some(Capture::MedlineDate),
                        "ArticleId" if !in_references && is_doi_id(e) => Some(Capture::Doi),
                        _ => None,
                    };

                    if let Some(kind) = next {
                        text.clear();
                        capture = Some((kind, stack.len()));
                    }
                }

                stack.push(tag_name);
            }
            Event::Text(ref e) => {
                if capture.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if capture.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(ref e) => {
                stack.pop();
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if let Some((kind, depth)) = capture {
                    if stack.len() == depth {
                        capture = None;
                        if let Some(article) = current.as_mut() {
                            article.commit(kind, std::mem::take(&mut text));
                        }
                    }
                }

                match tag_name.as_str() {
                    "Author" => {
                        if let Some(article) = current.as_mut() {
                            article.finish_author();
                        }
                    }
                    "PubmedArticle" => {
                        if let Some(article) = current.take() {
                            studies.push(article.into_study());
                        }
                        capture = None;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }

        buffer.clear();
    }

    Ok(studies)
}

fn is_doi_id(e: &quick_xml::events::BytesStart<'_>) -> bool {
    e.attributes()
        .filter_map(Result::ok)
        .any(|attr| attr.key.as_ref() == b"IdType" && attr.value.as_ref() == b"doi")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federated::{NO_ABSTRACT, NO_TITLE, UNKNOWN_DATE};

    const ARTICLES: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2024//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">37012345</PMID>
      <Article PubModel="Print">
        <Journal>
          <JournalIssue CitedMedium="Internet">
            <PubDate><Year>2023</Year><Month>Mar</Month></PubDate>
          </JournalIssue>
        </Journal>
        <ArticleTitle>Choline supplementation and <i>cognitive</i> outcomes.</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">Choline matters.</AbstractText>
          <AbstractText Label="RESULTS">Scores improved &amp; held.</AbstractText>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y"><LastName>Smith</LastName><ForeName>Jane</ForeName><Initials>J</Initials></Author>
          <Author ValidYN="Y"><CollectiveName>Choline Study Group</CollectiveName></Author>
          <Author ValidYN="Y"><LastName>Doe</LastName><ForeName>John</ForeName></Author>
        </AuthorList>
      </Article>
      <CommentsCorrectionsList>
        <CommentsCorrections RefType="Cites"><PMID Version="1">11111111</PMID></CommentsCorrections>
      </CommentsCorrectionsList>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">37012345</ArticleId>
        <ArticleId IdType="doi">10.1000/choline.2023</ArticleId>
      </ArticleIdList>
      <ReferenceList>
        <Reference>
          <Citation>Someone else.</Citation>
          <ArticleIdList><ArticleId IdType="doi">10.9999/cited</ArticleId></ArticleIdList>
        </Reference>
      </ReferenceList>
    </PubmedData>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">30000001</PMID>
      <Article>
        <Journal><JournalIssue><PubDate><MedlineDate>1998 Dec-1999 Jan</MedlineDate></PubDate></JournalIssue></Journal>
        <ArticleTitle></ArticleTitle>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_parse_search_ids() {
        let json = r#"{"header":{"type":"esearch"},"esearchresult":{"count":"2","idlist":["37012345","30000001"]}}"#;
        assert_eq!(parse_search_ids(json).unwrap(), vec!["37012345", "30000001"]);
    }

    #[test]
    fn test_parse_search_ids_missing_list() {
        assert!(parse_search_ids(r#"{"esearchresult":{"count":"0"}}"#)
            .unwrap()
            .is_empty());
        assert!(parse_search_ids("{}").unwrap().is_empty());
        assert!(parse_search_ids("not json").is_err());
    }

    #[test]
    fn test_parse_efetch_full_record() {
        let studies = parse_efetch(ARTICLES).unwrap();
        assert_eq!(studies.len(), 2);

        let first = &studies[0];
        assert_eq!(
            first.title,
            "Choline supplementation and cognitive outcomes."
        );
        assert_eq!(first.abstract_text, "Choline matters. Scores improved & held.");
        assert_eq!(first.authors, vec!["Jane Smith", "John Doe"]);
        assert_eq!(first.publish_date, "2023");
        assert_eq!(first.pmid.as_deref(), Some("37012345"));
        assert_eq!(first.url, "https://pubmed.ncbi.nlm.nih.gov/37012345/");
        assert_eq!(first.doi.as_deref(), Some("10.1000/choline.2023"));
        assert_eq!(first.source, Source::Pubmed);
    }

    #[test]
    fn test_parse_efetch_sparse_record() {
        let studies = parse_efetch(ARTICLES).unwrap();
        let second = &studies[1];
        assert_eq!(second.title, NO_TITLE);
        assert_eq!(second.abstract_text, NO_ABSTRACT);
        assert_eq!(second.publish_date, "1998");
        assert!(second.authors.is_empty());
        assert_eq!(second.doi, None);
    }

    #[test]
    fn test_record_without_date() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>1</PMID>\
                   <Article><ArticleTitle>T</ArticleTitle></Article></MedlineCitation>\
                   </PubmedArticle></PubmedArticleSet>";
        let studies = parse_efetch(xml).unwrap();
        assert_eq!(studies[0].publish_date, UNKNOWN_DATE);
    }

    #[test]
    fn test_empty_article_set() {
        assert!(parse_efetch("<PubmedArticleSet></PubmedArticleSet>")
            .unwrap()
            .is_empty());
    }
}
