//! Budgeted linear scan of a document's line index.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::{
    config::SearchBudget,
    document::{Document, LineIndexEntry},
    text_util::{contains_lower, context_window},
};

/// Lines that are index or table-of-contents furniture rather than content.
static INDEX_LINE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // bare numbers
        r"^\s*\d+\s*$",
        // short catalog codes such as "CTM107" or "PC-1234"
        r"^\s*[A-Z]{2,4}-?\d{1,4}\s*$",
        r"(?i)\b(?:alphabetical|index)\b",
        r"(?i)\bpage\s+\d+\b",
        r"(?i)copyright|©|all rights reserved|\bedition\b|printed in\b",
        // bracketed reference codes such as "[TM2301]"
        r"\[[A-Z0-9]{2,}(?:-[A-Z0-9]+)*\]",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid index line pattern"))
    .collect()
});

/// True if the line is index/TOC furniture that should never be a match.
pub fn is_index_line(text: &str) -> bool {
    INDEX_LINE_PATTERNS.iter().any(|p| p.is_match(text))
}

/// A matched line with its context window and score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub entry: LineIndexEntry<'a>,
    pub context: String,
    pub score: i32,
}

/// Collect lines containing any of `terms`.
///
/// Scans at most `budget.max_scan_lines` lines and stops once
/// `budget.max_candidates` lines have matched. `terms` must be lower-case.
pub fn collect_matches<'a, S: AsRef<str>>(
    document: &'a Document,
    terms: &[S],
    budget: &SearchBudget,
) -> Vec<LineIndexEntry<'a>> {
    if terms.is_empty() {
        return Vec::new();
    }

    let total = document.total_lines();
    let scan_limit = total.min(budget.max_scan_lines);
    let mut matches = Vec::new();

    for entry in document.line_index().take(scan_limit) {
        let lower = entry.text.to_lowercase();
        let hit = terms.iter().any(|t| contains_lower(&lower, t.as_ref()));
        if !hit || is_index_line(entry.text) {
            continue;
        }

        matches.push(entry);
        if matches.len() >= budget.max_candidates {
            debug!(
                document = %document.name,
                page = entry.page_number,
                "candidate budget reached"
            );
            break;
        }
    }

    if total > scan_limit {
        debug!(
            document = %document.name,
            total,
            scanned = scan_limit,
            "scan budget truncated document"
        );
    }

    matches
}

/// Build context windows for the first `budget.max_scored` matches.
pub fn build_candidates<'a>(
    matches: Vec<LineIndexEntry<'a>>,
    budget: &SearchBudget,
) -> Vec<Candidate<'a>> {
    matches
        .into_iter()
        .take(budget.max_scored)
        .map(|entry| Candidate {
            context: context_window(entry.previous_text, entry.text, entry.next_text),
            entry,
            score: 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_line_patterns() {
        for line in [
            "214",
            "  17 ",
            "CTM107",
            "PC-1234",
            "Alphabetical Index",
            "See page 12",
            "Copyright 2019 Deere & Company",
            "Third Edition",
            "[TM2301]",
        ] {
            assert!(is_index_line(line), "{line:?} should be index furniture");
        }
    }

    #[test]
    fn content_lines_are_kept() {
        for line in [
            "Engine oil filter, spin-on, RE504836",
            "Engine Oil Filter . . . . . . . 214",
            "Air cleaner element",
            "Pages are numbered",
        ] {
            assert!(!is_index_line(line), "{line:?} should be content");
        }
    }

    fn doc_with_lines(n: usize, text: &str) -> Document {
        let lines: Vec<String> = (0..n).map(|i| format!("{text} {i:04}x")).collect();
        Document::from_page_texts("big", &[lines.join("\n")])
    }

    #[test]
    fn matches_are_case_insensitive_and_skip_index_lines() {
        let doc = Document::from_page_texts(
            "d",
            &["OIL FILTER kit\nAlphabetical index oil\nseat belt\noil cooler"],
        );
        let found = collect_matches(&doc, &["oil"], &SearchBudget::default());
        let texts: Vec<_> = found.iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["OIL FILTER kit", "oil cooler"]);
    }

    #[test]
    fn candidate_budget_stops_scan() {
        let doc = doc_with_lines(500, "filter");
        let found = collect_matches(&doc, &["filter"], &SearchBudget::default());
        assert_eq!(found.len(), 200);
        assert_eq!(found.last().unwrap().line_number, 200);
    }

    #[test]
    fn scan_budget_limits_lines() {
        let mut lines: Vec<String> = (0..3000).map(|i| format!("seat {i}x")).collect();
        lines.push("filter beyond budget".into());
        let doc = Document::from_page_texts("big", &[lines.join("\n")]);
        assert!(collect_matches(&doc, &["filter"], &SearchBudget::default()).is_empty());

        let wide = SearchBudget {
            max_scan_lines: 5000,
            ..SearchBudget::default()
        };
        assert_eq!(collect_matches(&doc, &["filter"], &wide).len(), 1);
    }

    #[test]
    fn only_first_matches_are_scored() {
        let doc = doc_with_lines(150, "filter");
        let found = collect_matches(&doc, &["filter"], &SearchBudget::default());
        assert_eq!(found.len(), 150);
        let candidates = build_candidates(found, &SearchBudget::default());
        assert_eq!(candidates.len(), 100);
        assert!(candidates[1].context.contains("filter 0000x"));
        assert!(candidates[1].context.contains("filter 0002x"));
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        let doc = Document::from_page_texts("d", &["oil"]);
        let none: [&str; 0] = [];
        assert!(collect_matches(&doc, &none, &SearchBudget::default()).is_empty());

        let empty = Document::from_pages("e", Vec::<Vec<String>>::new());
        assert!(collect_matches(&empty, &["oil"], &SearchBudget::default()).is_empty());
    }
}
