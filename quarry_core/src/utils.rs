/// Default number of records requested per source when the caller passes 0.
pub const DEFAULT_LIMIT: u32 = 10;

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max` characters of `text` (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Number of Unicode scalar values in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The last `/`-delimited segment of a URL or path.
///
/// `http://arxiv.org/abs/2301.07041v1` -> `2301.07041v1`
pub fn last_path_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or_default()
}

/// Resolve a requested page size against a provider cap.
///
/// `0` selects [`DEFAULT_LIMIT`]; anything above `cap` is clamped to `cap`.
pub fn resolve_limit(requested: u32, cap: u32) -> u32 {
    let limit = if requested == 0 {
        DEFAULT_LIMIT
    } else {
        requested
    };
    limit.min(cap)
}

/// `Some(trimmed)` for non-blank input, `None` otherwise.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  Deep\n   Learning\tfor  Graphs "),
            "Deep Learning for Graphs"
        );
        assert_eq!(collapse_whitespace("\n\t "), "");
    }

    #[test]
    fn test_truncate_chars_is_char_based() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(
            last_path_segment("http://arxiv.org/abs/2301.07041v1"),
            "2301.07041v1"
        );
        assert_eq!(last_path_segment("plain"), "plain");
        assert_eq!(last_path_segment(""), "");
    }

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(0, 100), DEFAULT_LIMIT);
        assert_eq!(resolve_limit(25, 100), 25);
        assert_eq!(resolve_limit(500, 100), 100);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  key ")), Some("key".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
