/// Maximum characters taken from each line when building a context window.
pub const CONTEXT_LINE_MAX_CHARS: usize = 100;

/// Maximum characters in a context string reported to callers.
pub const LOCATION_CONTEXT_MAX_CHARS: usize = 200;

/// Lines taken above and below a match when building a snippet.
pub const SNIPPET_RADIUS: usize = 2;

/// Return the longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Truncate to `max_chars` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let cut = truncate_chars(text, max_chars);
    if cut.len() < text.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

/// Join the previous, current and next line into a single context string.
///
/// Each part is capped at [`CONTEXT_LINE_MAX_CHARS`] before joining; empty
/// parts are skipped.
pub fn context_window(previous: &str, current: &str, next: &str) -> String {
    [previous, current, next]
        .iter()
        .map(|part| truncate_chars(part.trim(), CONTEXT_LINE_MAX_CHARS))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive substring test against an already lower-cased needle.
pub fn contains_lower(haystack_lower: &str, needle_lower: &str) -> bool {
    !needle_lower.is_empty() && haystack_lower.contains(needle_lower)
}

/// True if `text` contains any of `terms`. `text` must be lower-case.
pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| text.contains(t))
}

/// Extract a snippet around the first line of `lines` containing `query`.
///
/// Returns `(snippet_text, match_line_number)` where the line number is
/// 1-indexed. The snippet spans [`SNIPPET_RADIUS`] lines on each side of the
/// match, joined with spaces and cut to [`LOCATION_CONTEXT_MAX_CHARS`].
/// Returns `None` if no line matches or the query is blank.
pub fn extract_snippet<S: AsRef<str>>(
    lines: &[S],
    query: &str,
) -> Option<(String, usize)> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return None;
    }

    let match_idx = lines
        .iter()
        .position(|line| line.as_ref().to_lowercase().contains(&query_lower))?;

    Some((snippet_around(lines, match_idx), match_idx + 1))
}

/// Build the snippet surrounding the line at `idx` (0-based).
pub fn snippet_around<S: AsRef<str>>(lines: &[S], idx: usize) -> String {
    let end = (idx + SNIPPET_RADIUS + 1).min(lines.len());
    let start = idx.saturating_sub(SNIPPET_RADIUS).min(end);

    let snippet = lines[start..end]
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    truncate_chars(&snippet, LOCATION_CONTEXT_MAX_CHARS).to_string()
}
