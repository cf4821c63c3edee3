//! String utilities for the domain layer.

/// Truncate text to at most `max_chars` characters, ending with `...` when cut.
///
/// Counts `char`s rather than bytes so multi-byte text is never split.
pub fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    let kept = out.trim_end().len();
    out.truncate(kept);
    out.push_str("...");
    out
}

/// Collapse every run of whitespace (including newlines) into a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Does `haystack` contain `keyword` starting at a word boundary?
///
/// Both sides are expected to be lower-cased already. A keyword may be a
/// stem ("cardio" matches "cardiovascular") or a phrase ("side effect").
pub fn contains_word_prefix(haystack: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    haystack.match_indices(keyword).any(|(idx, _)| {
        haystack[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}
