//! Prompt template rendering for note analysis.

/// Placeholder replaced by the note text.
pub const NOTE_PLACEHOLDER: &str = "{NOTE_CONTENT}";

pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"Based on the following note content, identify key research topics and suggest relevant search queries for finding related academic research:

{NOTE_CONTENT}

Please provide:
1. Main research topics (3-5 topics)
2. Suggested search queries for each topic
3. Any trends or connections you notice

Format your response as JSON with the structure:
{
  "topics": ["topic1", "topic2", ...],
  "queries": ["query1", "query2", ...],
  "trends": "brief analysis"
}"#;

/// Substitute the note into the first `{NOTE_CONTENT}` of `template`.
///
/// Later occurrences are left as-is, as is a template without one.
pub fn render_prompt(template: &str, note: &str) -> String {
    template.replacen(NOTE_PLACEHOLDER, note, 1)
}

/// Whether a custom template will actually receive the note.
pub fn has_placeholder(template: &str) -> bool {
    template.contains(NOTE_PLACEHOLDER)
}
