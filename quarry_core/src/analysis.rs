//! Turns free-form model output into search topics, queries and a trend
//! summary.
//!
//! The model is asked for a JSON object, but it does not always comply. When
//! no decodable `{...}` block is present the text is scanned line by line for
//! `Topics:` / `Queries:` / `Trends:` headed sections instead.

use crate::utils::{char_len, truncate_chars};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Placeholder used when a structured response carries no trend text.
pub const NO_TRENDS: &str = "No trend analysis available";

/// At most this many topics and queries are kept.
pub const MAX_ITEMS: usize = 5;

/// Length of the raw-response excerpt used when no trend section was found.
pub const TRENDS_EXCERPT_CHARS: usize = 500;

const FALLBACK_WORD_MIN_CHARS: usize = 5;
const FALLBACK_WORD_POOL: usize = 50;
const FALLBACK_QUERY_WORDS: usize = 10;
const SEEDED_TOPICS: usize = 3;

// Greedy: first '{' through last '}'.
static JSON_BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*•\d.)\]]+\s*").unwrap());

/// What the model extracted from a note.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub topics: Vec<String>,
    pub queries: Vec<String>,
    pub trends: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Topics,
    Queries,
    Trends,
}

/// Interpret a model response. Never fails.
///
/// `original_content` is the note that was analysed; it is only used to
/// synthesize a query when the response yields none.
pub fn interpret(raw_text: &str, original_content: &str) -> AnalysisResult {
    if let Some(result) = interpret_structured(raw_text) {
        debug!(
            topics = result.topics.len(),
            queries = result.queries.len(),
            "structured analysis parsed"
        );
        return result;
    }

    let result = interpret_heuristic(raw_text, original_content);
    debug!(
        topics = result.topics.len(),
        queries = result.queries.len(),
        "analysis recovered by line scan"
    );
    result
}

fn interpret_structured(raw_text: &str) -> Option<AnalysisResult> {
    let block = JSON_BLOCK_RE.find(raw_text)?;
    let value: Value = match serde_json::from_str(block.as_str()) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "JSON block did not decode");
            return None;
        }
    };
    let object = value.as_object()?;

    let trends = object
        .get("trends")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_TRENDS)
        .to_string();

    Some(AnalysisResult {
        topics: string_list(object.get("topics")),
        queries: string_list(object.get("queries")),
        trends,
    })
}

// Non-string elements are skipped; a missing or non-array value is empty.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .take(MAX_ITEMS)
                .collect()
        })
        .unwrap_or_default()
}

fn interpret_heuristic(raw_text: &str, original_content: &str) -> AnalysisResult {
    let mut topics = Vec::new();
    let mut queries = Vec::new();
    let mut trends = String::new();
    let mut section = Section::None;

    for line in raw_text.lines().filter(|l| !l.trim().is_empty()) {
        let lower = line.to_lowercase();
        if lower.contains(':') {
            let heading = if lower.contains("topic") {
                Some(Section::Topics)
            } else if lower.contains("quer") {
                Some(Section::Queries)
            } else if lower.contains("trend") {
                Some(Section::Trends)
            } else {
                None
            };
            if let Some(next) = heading {
                section = next;
                continue;
            }
        }

        match section {
            Section::Topics => push_item(&mut topics, line),
            Section::Queries => push_item(&mut queries, line),
            Section::Trends => {
                trends.push_str(line);
                trends.push(' ');
            }
            Section::None => {}
        }
    }

    if queries.is_empty() {
        if let Some(query) = fallback_query(original_content) {
            queries.push(query);
        }
    }
    if topics.is_empty() && !queries.is_empty() {
        topics.extend(queries.iter().take(SEEDED_TOPICS).cloned());
    }

    topics.truncate(MAX_ITEMS);
    queries.truncate(MAX_ITEMS);

    let trends = match trends.trim() {
        "" => truncate_chars(raw_text, TRENDS_EXCERPT_CHARS),
        text => text.to_string(),
    };

    AnalysisResult {
        topics,
        queries,
        trends,
    }
}

// Leading indentation is dropped before the marker, so nested bullets are
// stripped like top-level ones.
fn push_item(items: &mut Vec<String>, line: &str) {
    let cleaned = BULLET_RE.replace(line.trim_start(), "");
    let cleaned = cleaned.trim();
    if char_len(cleaned) > 2 {
        items.push(cleaned.to_string());
    }
}

/// One query built from the note's longer words, or `None` if it has none.
fn fallback_query(original_content: &str) -> Option<String> {
    let words: Vec<&str> = original_content
        .split_whitespace()
        .filter(|w| char_len(w) >= FALLBACK_WORD_MIN_CHARS)
        .take(FALLBACK_WORD_POOL)
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(
        words
            .into_iter()
            .take(FALLBACK_QUERY_WORDS)
            .collect::<Vec<_>>()
            .join(" "),
    )
}
