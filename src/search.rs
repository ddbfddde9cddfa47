use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    config::SearchConfig,
    document::{Document, Page},
    error::Result,
    filter::{Candidate, build_candidates, collect_matches},
    identifier::{extract_part_numbers_from_page, find_relevant_part_number, is_item_number},
    navigation::{ResolutionStatus, process_search_results, strip_leader},
    query::{QueryTerms, query_terms},
    rules::{is_relevant_for_query, score_context},
    text_util::{
        CONTEXT_LINE_MAX_CHARS,
        LOCATION_CONTEXT_MAX_CHARS,
        truncate_chars,
        truncate_with_ellipsis,
    },
};

/// Characters of the name compared when deduplicating results.
const DEDUP_NAME_PREFIX_CHARS: usize = 30;

const HUMAN_NAME_MAX_CHARS: usize = 60;

/// Where a match sits in its document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub page_number: usize,
    pub line_number: usize,
    pub y_position: f32,
    /// Context window, at most 200 characters.
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A ranked match returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Name of the document the match came from.
    pub document: String,
    pub part_number: Option<String>,
    pub name: String,
    pub score: i32,
    pub location: Location,
    pub is_followed_from_index: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_page_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_part_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number_confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionStatus>,
}

impl SearchResult {
    fn dedup_key(&self) -> (String, String) {
        let name = truncate_chars(&self.name, DEDUP_NAME_PREFIX_CHARS).to_lowercase();
        (self.part_number.clone().unwrap_or_default(), name)
    }
}

/// Search one document with the default configuration.
pub fn search(document: &Document, query: &str) -> Vec<SearchResult> {
    search_with_config(document, query, &SearchConfig::default())
}

/// Run the filter, gate, score and classify stages over one document.
///
/// 1. Normalize the query and expand it into terms
/// 2. Collect matching lines under the scan and candidate budgets
/// 3. Build context windows for the first `max_scored` matches
/// 4. Drop candidates failing the relevance gate or scoring below `min_score`
/// 5. Attach the best part number from the context window
/// 6. Deduplicate, sort and truncate
pub fn search_with_config(
    document: &Document,
    query: &str,
    config: &SearchConfig,
) -> Vec<SearchResult> {
    if query.trim().is_empty() || document.is_empty() {
        return Vec::new();
    }

    let QueryTerms { canonical, terms } = query_terms(query);
    let matches = collect_matches(document, &terms, &config.budget);
    let matched = matches.len();
    let candidates = build_candidates(matches, &config.budget);
    let scored = candidates.len();

    let results: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|mut candidate| {
            if !is_relevant_for_query(&candidate.context, &canonical) {
                trace!(
                    page = candidate.entry.page_number,
                    line = candidate.entry.line_number,
                    "rejected by relevance gate"
                );
                return None;
            }
            candidate.score = score_context(&candidate.context, &canonical, &terms);
            if candidate.score < config.min_score {
                trace!(
                    page = candidate.entry.page_number,
                    line = candidate.entry.line_number,
                    score = candidate.score,
                    "below score threshold"
                );
                return None;
            }
            Some(to_result(document, candidate, &canonical))
        })
        .collect();

    debug!(
        document = %document.name,
        query = %canonical,
        terms = terms.len(),
        matched,
        scored,
        accepted = results.len(),
        "searched document"
    );

    assemble(results, config.max_results)
}

fn to_result(document: &Document, candidate: Candidate<'_>, canonical: &str) -> SearchResult {
    let entry = candidate.entry;
    let window = [entry.previous_text, entry.text, entry.next_text].join("\n");
    let identifiers = extract_part_numbers_from_page(&window);
    let part_number =
        find_relevant_part_number(&identifiers, entry.text, canonical).map(|c| c.value.clone());

    SearchResult {
        document: document.name.clone(),
        part_number,
        name: display_name(entry.text),
        score: candidate.score,
        location: Location {
            page_number: entry.page_number,
            line_number: entry.line_number,
            y_position: entry.y,
            context: truncate_chars(&candidate.context, LOCATION_CONTEXT_MAX_CHARS).to_string(),
            section: document.page(entry.page_number).and_then(Page::section_label),
        },
        is_followed_from_index: false,
        index_page_number: None,
        item_number: leading_item_number(entry.text),
        actual_part_number: None,
        part_number_confidence: None,
        resolution: None,
    }
}

/// The matched line without its dotted leader, capped in length.
fn display_name(text: &str) -> String {
    truncate_chars(strip_leader(text).trim(), CONTEXT_LINE_MAX_CHARS).to_string()
}

/// A diagram item number opening the line, as in "8843 Oil filter element".
fn leading_item_number(text: &str) -> Option<String> {
    let mut words = text.split_whitespace();
    let first = words.next()?;
    (words.next().is_some() && is_item_number(first)).then(|| first.to_string())
}

/// Deduplicate by (part number, name prefix) and sort best first.
///
/// Ties are broken by document, page and line so the output is stable.
pub fn assemble(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.document.cmp(&b.document))
            .then(a.location.page_number.cmp(&b.location.page_number))
            .then(a.location.line_number.cmp(&b.location.line_number))
    });

    let mut seen = HashSet::new();
    results.retain(|r| seen.insert(r.dedup_key()));
    results.truncate(limit);
    results
}

/// Search several documents and follow index hits to their content.
pub fn find_parts(
    documents: &[Document],
    query: &str,
    config: &SearchConfig,
) -> Vec<SearchResult> {
    let per_document: Vec<Vec<SearchResult>> = documents
        .par_iter()
        .map(|d| search_with_config(d, query, config))
        .collect();

    let merged = assemble(per_document.into_iter().flatten().collect(), config.max_results);
    if !config.follow_index {
        return merged;
    }

    assemble(
        process_search_results(merged, documents, query),
        config.max_results,
    )
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results found.");
        return;
    }

    for (i, r) in results.iter().enumerate() {
        println!(
            "{:>3}. [{:>3}] {:<12} {}",
            i + 1,
            r.score,
            r.part_number.as_deref().unwrap_or("-"),
            truncate_with_ellipsis(&r.name, HUMAN_NAME_MAX_CHARS)
        );
        let mut origin = format!(
            "     {} p.{} l.{}",
            r.document, r.location.page_number, r.location.line_number
        );
        if let Some(index_page) = r.index_page_number {
            origin.push_str(&format!(" (via index p.{index_page})"));
        }
        if let Some(item) = &r.item_number {
            origin.push_str(&format!(" item {item}"));
        }
        println!("{origin}");
    }
    println!("\n{} result(s)", results.len());
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    query: &'a str,
    result_count: usize,
    results: &'a [SearchResult],
}

/// Format results as JSON output.
pub fn format_json(results: &[SearchResult], query: &str) -> Result<()> {
    let output = JsonOutput {
        query,
        result_count: results.len(),
        results,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
