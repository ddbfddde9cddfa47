//! Following index and table-of-contents hits to their content page.
//!
//! A match on an index page ("Engine Oil Filter . . . . 214") is rarely what
//! the caller wants: the part number lives on page 214. This module detects
//! such pages, pulls the referenced page number out of the matched line,
//! looks for the search term on the target page and moves the match there.
//! A result is redirected at most once.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::{
    document::Document,
    identifier::{
        IdentifierCandidate,
        extract_part_numbers_from_lines,
        find_relevant_part_number,
        is_item_number,
        is_part_number,
    },
    query::normalize_query,
    search::{Location, SearchResult},
    text_util::{
        LOCATION_CONTEXT_MAX_CHARS,
        extract_snippet,
        snippet_around,
        truncate_chars,
    },
};

static INDEX_HEADINGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:table\s+of\s+contents|contents|index|parts\s+list|component\s+list)\b",
    )
    .expect("valid index heading pattern")
});

/// Three or more dots (optionally spaced) followed by a 1-4 digit number.
static DOTTED_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\.[ \t]*){3,}(\d{1,4})\b").expect("valid dotted reference pattern")
});

/// A dotted leader and page number ending a line.
static DOTTED_LEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\.[ \t]*){3,}\d{1,4}[ \t]*$").expect("valid dotted leader pattern")
});

/// A leading page number followed by an upper-case-led phrase: "214 Engine Oil Filter".
static LEADING_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,4})\s+([A-Z]\S*[^\n]*)").expect("valid leading reference pattern")
});

/// Characters of the source context kept on a [`PageReference`].
const REFERENCE_SNIPPET_CHARS: usize = 100;

/// A citation of another page found in a line of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReference {
    pub target_page_number: usize,
    pub matched_reference_text: String,
    pub source_context_snippet: String,
}

impl PageReference {
    fn new(target: &str, matched: &str, context: &str) -> Option<Self> {
        let target_page_number = target.parse::<usize>().ok().filter(|n| *n > 0)?;
        Some(Self {
            target_page_number,
            matched_reference_text: matched.trim().to_string(),
            source_context_snippet: truncate_chars(context.trim(), REFERENCE_SNIPPET_CHARS)
                .to_string(),
        })
    }
}

/// True if the page text looks like an index, table of contents or parts list.
pub fn is_index_page(text: &str) -> bool {
    INDEX_HEADINGS.is_match(text) || dotted_leader_lines(text) > 0
}

/// Number of lines ending in a dotted leader and page number.
pub fn dotted_leader_lines(text: &str) -> usize {
    text.lines().filter(|l| DOTTED_LEADER_LINE.is_match(l)).count()
}

/// Strip a trailing dotted leader and page number from a line.
pub fn strip_leader(text: &str) -> &str {
    match DOTTED_REFERENCE.find(text) {
        Some(m) if text[m.end()..].trim().is_empty() => text[..m.start()].trim_end(),
        _ => text.trim_end(),
    }
}

/// Extract the page number cited by a dotted leader in `context`.
pub fn extract_page_reference(context: &str) -> Option<PageReference> {
    let caps = DOTTED_REFERENCE.captures(context)?;
    PageReference::new(&caps[1], &caps[0], context)
}

/// Extract a "N Capitalized Phrase" reference from the start of `context`.
///
/// Works on any text, not only on detected index pages. A reference to
/// `current_page` is ignored.
pub fn extract_page_reference_from_context(
    context: &str,
    current_page: usize,
) -> Option<PageReference> {
    let caps = LEADING_REFERENCE.captures(context)?;
    PageReference::new(&caps[1], &caps[0], context)
        .filter(|r| r.target_page_number != current_page)
}

/// Index pages of a document and the references they carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPageSummary {
    pub page_number: usize,
    pub references: Vec<PageReference>,
}

/// List every index-style page with the dotted-leader references on it.
pub fn index_pages(document: &Document) -> Vec<IndexPageSummary> {
    document
        .pages
        .iter()
        .filter(|p| is_index_page(&p.text()))
        .map(|p| IndexPageSummary {
            page_number: p.number,
            references: p
                .lines
                .iter()
                .filter_map(|l| extract_page_reference(&l.text))
                .collect(),
        })
        .collect()
}

/// How far a redirect attempt got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// The search term was found on the target page.
    Resolved,
    /// The term was missing but the target page carries part numbers.
    PartialResolved,
    Unresolved,
}

/// Where a redirect landed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHit {
    pub page_number: usize,
    pub line_number: usize,
    pub y: f32,
    pub context: String,
    pub section: Option<String>,
    pub part_number: Option<IdentifierCandidate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedHit),
    PartialResolved(ResolvedHit),
    Unresolved,
}

impl Resolution {
    pub fn status(&self) -> ResolutionStatus {
        match self {
            Self::Resolved(_) => ResolutionStatus::Resolved,
            Self::PartialResolved(_) => ResolutionStatus::PartialResolved,
            Self::Unresolved => ResolutionStatus::Unresolved,
        }
    }

    pub fn hit(&self) -> Option<&ResolvedHit> {
        match self {
            Self::Resolved(hit) | Self::PartialResolved(hit) => Some(hit),
            Self::Unresolved => None,
        }
    }
}

/// Look for the first of `search_terms` on `target_page`.
///
/// A page outside the document counts as having no content.
pub fn resolve_on_page<S: AsRef<str>>(
    document: &Document,
    target_page: usize,
    search_terms: &[S],
) -> Resolution {
    let Some(page) = document.page(target_page) else {
        return Resolution::Unresolved;
    };

    let texts: Vec<&str> = page.lines.iter().map(|l| l.text.as_str()).collect();
    let candidates = extract_part_numbers_from_lines(texts.iter().copied());

    for term in search_terms.iter().map(|t| t.as_ref().trim()) {
        if let Some((context, line_number)) = extract_snippet(&texts, term) {
            let line = &page.lines[line_number - 1];
            return Resolution::Resolved(ResolvedHit {
                page_number: page.number,
                line_number,
                y: line.y,
                context,
                section: page.section_label(),
                part_number: find_relevant_part_number(&candidates, &line.text, term)
                    .cloned(),
            });
        }
    }

    match candidates.into_iter().next() {
        Some(top) => {
            let y = page.line(top.line_number).map_or(0.0, |l| l.y);
            Resolution::PartialResolved(ResolvedHit {
                page_number: page.number,
                line_number: top.line_number,
                y,
                context: snippet_around(&texts, top.line_number - 1),
                section: page.section_label(),
                part_number: Some(top),
            })
        }
        None => Resolution::Unresolved,
    }
}

/// Move `result` to the location of `hit`.
pub fn apply_resolution(result: &mut SearchResult, hit: &ResolvedHit, status: ResolutionStatus) {
    let index_page = result.location.page_number;

    if result.item_number.is_none()
        && let Some(original) = &result.part_number
        && is_item_number(original)
    {
        result.item_number = Some(original.clone());
    }

    result.location = Location {
        page_number: hit.page_number,
        line_number: hit.line_number,
        y_position: hit.y,
        context: truncate_chars(&hit.context, LOCATION_CONTEXT_MAX_CHARS).to_string(),
        section: hit.section.clone(),
    };
    result.is_followed_from_index = true;
    result.index_page_number = Some(index_page);
    result.resolution = Some(status);

    if let Some(candidate) = &hit.part_number {
        result.actual_part_number = Some(candidate.value.clone());
        result.part_number_confidence = Some(candidate.confidence);
        if result.part_number.as_deref().is_none_or(|p| !is_part_number(p)) {
            result.part_number = Some(candidate.value.clone());
        }
    }
}

/// Apply index navigation to every result.
///
/// The formal index-page reference is tried first, the leading-number
/// context reference second; the first one that lands is applied. Results
/// that were already redirected are returned untouched.
pub fn process_search_results(
    results: Vec<SearchResult>,
    documents: &[Document],
    original_query: &str,
) -> Vec<SearchResult> {
    results
        .into_iter()
        .map(|r| resolve_result(r, documents, original_query))
        .collect()
}

/// Which detector produced a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceSource {
    IndexPage,
    Context,
}

fn resolve_result(
    mut result: SearchResult,
    documents: &[Document],
    original_query: &str,
) -> SearchResult {
    if result.is_followed_from_index {
        return result;
    }
    let Some(document) = find_document(documents, &result.document) else {
        return result;
    };

    let page_number = result.location.page_number;
    let line_text = document
        .line(page_number, result.location.line_number)
        .map(|l| l.text.clone())
        .unwrap_or_else(|| result.location.context.clone());

    let mut references = Vec::new();
    if document.page(page_number).is_some_and(|p| is_index_page(&p.text()))
        && let Some(reference) = extract_page_reference(&line_text)
        && reference.target_page_number != page_number
    {
        references.push((ReferenceSource::IndexPage, reference));
    }
    if let Some(reference) = extract_page_reference_from_context(&line_text, page_number)
        && !references
            .iter()
            .any(|(_, r)| r.target_page_number == reference.target_page_number)
    {
        references.push((ReferenceSource::Context, reference));
    }

    if references.is_empty() {
        result.resolution = Some(ResolutionStatus::Unresolved);
        return result;
    }

    let terms = search_terms(&result, original_query);
    for (source, reference) in &references {
        let resolution = resolve_on_page(document, reference.target_page_number, &terms);
        let accepted = match (&resolution, source) {
            (Resolution::Resolved(_), _) => true,
            (Resolution::PartialResolved(_), ReferenceSource::IndexPage) => true,
            _ => false,
        };
        if accepted && let Some(hit) = resolution.hit() {
            debug!(
                document = %document.name,
                from = page_number,
                to = hit.page_number,
                status = ?resolution.status(),
                "followed page reference"
            );
            apply_resolution(&mut result, hit, resolution.status());
            return result;
        }
    }

    result.resolution = Some(ResolutionStatus::Unresolved);
    result
}

fn find_document<'a>(documents: &'a [Document], name: &str) -> Option<&'a Document> {
    documents.iter().find(|d| d.name == name)
}

/// Terms to look for on the target page: part number, name, then query.
fn search_terms(result: &SearchResult, original_query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    let part_number = result
        .part_number
        .as_deref()
        .filter(|p| is_part_number(p))
        .map(ToString::to_string);
    let candidates = part_number.into_iter().chain([
        strip_leader(&result.name).trim().to_string(),
        original_query.trim().to_string(),
        normalize_query(original_query),
    ]);
    for term in candidates {
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}
