//! Query normalization and synonym expansion.
//!
//! Free-text questions ("where is the engine oil filter?") are reduced to a
//! canonical component phrase, which is then expanded into the set of terms
//! the candidate filter looks for.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum expansion terms taken from one synonym entry on a partial match.
pub const MAX_PARTIAL_EXPANSION: usize = 3;

/// Conversational lead-ins, longest first so that the most specific wins.
const CONVERSATIONAL_PREFIXES: &[&str] = &[
    "where can i find",
    "can you show me",
    "i am looking for",
    "i'm looking for",
    "im looking for",
    "can you find",
    "looking for",
    "what is the",
    "where is",
    "where's",
    "show me",
    "find me",
    "give me",
    "get me",
    "tell me",
    "what is",
    "what's",
    "i need",
    "i want",
    "please",
    "need",
    "find",
];

/// Ordered component patterns. The first match becomes the canonical phrase.
static COMPONENT_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> =
    LazyLock::new(|| {
        [
            (
                r"\bengine\s+(?:oil|lube)\s+(?:filters?|elements?)\b|\boil\s+filters?\b.*\bengine\b",
                "engine oil filter",
            ),
            (
                r"\b(?:transmission|powershift)\s+(?:oil\s+)?filters?\b",
                "transmission filter",
            ),
            (r"\bhydraulic\s+(?:oil\s+)?filters?\b", "hydraulic filter"),
            (r"\b(?:oil|lube)\s+filters?\b", "oil filter"),
            (
                r"\b(?:cab(?:in)?|fresh)\s+(?:air\s+)?filters?\b",
                "cabin filter",
            ),
            (r"\bair\s+(?:filters?|cleaners?|elements?)\b", "air filter"),
            (r"\bfuel\s+(?:filters?|elements?|strainers?)\b", "fuel filter"),
            (r"\b(?:fan|drive|serpentine|v-)\s*belts?\b", "fan belt"),
        ]
        .into_iter()
        .map(|(pattern, canonical)| {
            (
                Regex::new(pattern).expect("valid component pattern"),
                canonical,
            )
        })
        .collect()
    });

static FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bpart\s+(?:numbers?|no\b\.?|#)|\bp/n\b|\b(?:the|a|an|of|for|my|is|are|on|in|what|which|page|number)\b",
    )
    .expect("valid filler pattern")
});

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?!,;:]+|\.+(?:\s|$)").expect("valid punctuation pattern"));

/// Synonym table: component phrase to equivalent wording seen in manuals.
const SYNONYMS: &[(&str, &[&str])] = &[
    (
        "air filter",
        &[
            "air cleaner",
            "air element",
            "intake filter",
            "primary air filter",
            "secondary air filter",
            "air cleaner element",
        ],
    ),
    (
        "engine oil filter",
        &[
            "oil filter",
            "lube filter",
            "engine oil",
            "lube oil filter",
            "spin-on filter",
        ],
    ),
    (
        "oil filter",
        &["lube filter", "oil element", "engine oil filter", "spin-on filter"],
    ),
    (
        "fuel filter",
        &[
            "fuel element",
            "fuel strainer",
            "water separator",
            "primary fuel filter",
            "final fuel filter",
        ],
    ),
    (
        "hydraulic filter",
        &["hydraulic oil filter", "hydraulic element", "return filter"],
    ),
    (
        "transmission filter",
        &[
            "transmission oil filter",
            "powershift filter",
            "gearbox filter",
        ],
    ),
    (
        "cabin filter",
        &["cab air filter", "fresh air filter", "recirculation filter"],
    ),
    ("fan belt", &["drive belt", "serpentine belt", "v-belt"]),
];

/// Words too generic to drive a partial synonym match on their own.
const GENERIC_WORDS: &[&str] = &["filter", "filters", "element", "part"];

/// The canonical phrase of a query plus every term to scan for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerms {
    pub canonical: String,
    /// Lower-cased, deduplicated, in insertion order.
    pub terms: Vec<String>,
}

/// Reduce a free-text query to its canonical component phrase.
///
/// Known component patterns take precedence over generic cleanup. When
/// cleanup changes nothing, the original (trimmed) query is returned as is.
pub fn normalize_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let lower = trimmed.to_lowercase();
    let cleaned = generic_cleanup(strip_prefixes(&lower));

    if let Some((_, canonical)) = COMPONENT_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&cleaned))
    {
        return (*canonical).to_string();
    }

    if cleaned.is_empty() || cleaned == lower {
        return trimmed.to_string();
    }
    cleaned
}

fn strip_prefixes(text: &str) -> &str {
    let mut rest = text.trim_start();
    'outer: loop {
        for prefix in CONVERSATIONAL_PREFIXES {
            if let Some(after) = rest.strip_prefix(prefix)
                && after.chars().next().is_none_or(|c| !c.is_alphanumeric())
            {
                rest = after.trim_start();
                continue 'outer;
            }
        }
        return rest;
    }
}

fn generic_cleanup(text: &str) -> String {
    let without_filler = FILLER.replace_all(text, " ");
    let without_punct = PUNCTUATION.replace_all(&without_filler, " ");
    without_punct.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expand a canonical phrase into equivalent terms.
///
/// Exact keys return their full synonym list; a key contained in the phrase
/// is used next. Otherwise every key sharing a significant word contributes
/// at most [`MAX_PARTIAL_EXPANSION`] terms.
pub fn expand_query(phrase: &str) -> Vec<String> {
    let lower = phrase.trim().to_lowercase();
    if lower.is_empty() {
        return Vec::new();
    }

    let full = SYNONYMS
        .iter()
        .find(|(key, _)| *key == lower)
        .or_else(|| SYNONYMS.iter().find(|(key, _)| lower.contains(key)));
    if let Some((_, terms)) = full {
        return terms.iter().map(ToString::to_string).collect();
    }

    let words: Vec<&str> = lower
        .split_whitespace()
        .filter(|w| w.len() > 2 && !GENERIC_WORDS.contains(w))
        .collect();

    SYNONYMS
        .iter()
        .filter(|(key, _)| key.split_whitespace().any(|kw| words.contains(&kw)))
        .flat_map(|(_, terms)| terms.iter().take(MAX_PARTIAL_EXPANSION))
        .map(ToString::to_string)
        .collect()
}

/// Normalize `query` and build its full term set.
pub fn query_terms(query: &str) -> QueryTerms {
    let canonical = normalize_query(query);
    let lower = canonical.to_lowercase();

    let words = lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '/'))
        .filter(|w| w.chars().count() >= 2)
        .map(ToString::to_string);

    let mut terms: Vec<String> = Vec::new();
    for term in words.chain(expand_query(&lower)) {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }

    QueryTerms { canonical, terms }
}
