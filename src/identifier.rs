//! Item numbers versus orderable part numbers.
//!
//! Parts catalogs print two kinds of codes next to a component: a short
//! numeric *item number* that only locates the part in an exploded diagram,
//! and an alphanumeric *part number* that can actually be ordered. An
//! item-shaped value is never accepted as a part number.

use std::{collections::HashMap, fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

/// Confidence every extracted identifier starts from.
const BASE_CONFIDENCE: u32 = 50;
const MAX_CONFIDENCE: u32 = 100;

/// Bare 3-5 digit numeral.
static ITEM_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,5}$").expect("valid item pattern"));

static PART_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // RE508960, AH1234
        r"^[A-Z]{1,3}\d{3,8}$",
        // RE-508960
        r"^[A-Z]{1,3}-\d{3,8}$",
        // 1R0750, 1R-0750, 4N-5476
        r"^\d{1,3}[A-Z]{1,2}-?\d{3,6}$",
        // generic 6-12 characters, digit presence checked separately
        r"^[A-Z0-9][A-Z0-9-]{4,10}[A-Z0-9]$",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid part number pattern"))
    .collect()
});

/// The high-confidence `{1-3 letters}{5-8 digits}` shape.
static TIGHT_PART_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,3}\d{5,8}$").expect("valid tight pattern")
});

/// Explicitly labelled values: `Part No: X`, `P/N X`, `Order: X`.
static LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:part\s*(?:no\b\.?|number|#)|p/n|order(?:\s*(?:no\b\.?|number))?)\s*[:#]?\s*([A-Za-z0-9][A-Za-z0-9-]{2,14})",
    )
    .expect("valid label pattern")
});

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9][A-Za-z0-9-]*[A-Za-z0-9]").expect("valid token pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    ItemNumber,
    PartNumber,
    Unknown,
}

impl IdentifierKind {
    /// Classify a single value. Case and surrounding whitespace are ignored.
    pub fn classify(value: &str) -> Self {
        let value = value.trim().to_uppercase();
        if ITEM_NUMBER.is_match(&value) {
            Self::ItemNumber
        } else if value.chars().any(|c| c.is_ascii_digit())
            && PART_NUMBER_PATTERNS.iter().any(|p| p.is_match(&value))
        {
            Self::PartNumber
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ItemNumber => "item number",
            Self::PartNumber => "part number",
            Self::Unknown => "unknown",
        })
    }
}

pub fn is_item_number(value: &str) -> bool {
    IdentifierKind::classify(value) == IdentifierKind::ItemNumber
}

pub fn is_part_number(value: &str) -> bool {
    IdentifierKind::classify(value) == IdentifierKind::PartNumber
}

/// True if any whitespace-separated token of `text` is part-number shaped.
pub fn contains_part_number(text: &str) -> bool {
    bare_part_numbers(text).next().is_some()
}

/// A part number found on a page, with how sure we are about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierCandidate {
    pub value: String,
    /// 1-based line the value was found on.
    pub line_number: usize,
    /// The full text of that line.
    pub context: String,
    /// 0-100.
    pub confidence: u8,
}

fn bare_part_numbers(line: &str) -> impl Iterator<Item = &str> {
    TOKEN
        .find_iter(line)
        .map(|m| m.as_str())
        .filter(|t| !t.chars().any(char::is_lowercase))
        .filter(|t| is_part_number(t))
}

fn labelled_values(line: &str) -> impl Iterator<Item = String> + '_ {
    LABELLED
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('-').to_uppercase())
        .filter(|v| v.chars().any(|c| c.is_ascii_digit()))
        .filter(|v| !is_item_number(v))
}

fn confidence(line_lower: &str, value: &str) -> u8 {
    let mut score = BASE_CONFIDENCE;
    if line_lower.contains("part no") || line_lower.contains("part number") {
        score += 30;
    }
    if line_lower.contains("p/n") {
        score += 25;
    }
    if line_lower.contains("order") {
        score += 20;
    }
    if line_lower.contains("catalog") {
        score += 15;
    }
    if line_lower.contains("specification") || line_lower.contains("model") {
        score += 10;
    }
    if TIGHT_PART_NUMBER.is_match(value) {
        score += 20;
    }
    if value.len() >= 8 {
        score += 10;
    }
    score.min(MAX_CONFIDENCE) as u8
}

/// Extract every part number on a page, best first.
///
/// Values are deduplicated, keeping the highest-confidence occurrence (the
/// earliest on ties). Ordering is by confidence descending, then line.
pub fn extract_part_numbers_from_page(text: &str) -> Vec<IdentifierCandidate> {
    extract_part_numbers_from_lines(text.lines())
}

/// Like [`extract_part_numbers_from_page`], numbering candidates by their
/// position in `lines`.
pub fn extract_part_numbers_from_lines<'a>(
    lines: impl IntoIterator<Item = &'a str>,
) -> Vec<IdentifierCandidate> {
    let mut found: Vec<IdentifierCandidate> = Vec::new();
    let mut by_value: HashMap<String, usize> = HashMap::new();

    for (idx, line) in lines.into_iter().enumerate() {
        let lower = line.to_lowercase();
        let values = labelled_values(line)
            .chain(bare_part_numbers(line).map(ToString::to_string));

        for value in values {
            let candidate = IdentifierCandidate {
                confidence: confidence(&lower, &value),
                value,
                line_number: idx + 1,
                context: line.trim().to_string(),
            };
            match by_value.get(&candidate.value) {
                Some(&existing) => {
                    if candidate.confidence > found[existing].confidence {
                        found[existing] = candidate;
                    }
                }
                None => {
                    by_value.insert(candidate.value.clone(), found.len());
                    found.push(candidate);
                }
            }
        }
    }

    found.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then(a.line_number.cmp(&b.line_number))
    });
    found
}

/// Pick the candidate that best fits a matched line and search term.
///
/// Rank is confidence, +40 when the value appears in `context_line`, +20
/// when both the candidate's own line and the term mention "filter", and
/// +20 for "oil" likewise. The earliest candidate wins ties.
pub fn find_relevant_part_number<'a>(
    candidates: &'a [IdentifierCandidate],
    context_line: &str,
    search_term: &str,
) -> Option<&'a IdentifierCandidate> {
    let context_lower = context_line.to_lowercase();
    let term_lower = search_term.to_lowercase();
    let term_filter = term_lower.contains("filter");
    let term_oil = term_lower.contains("oil");

    candidates
        .iter()
        .map(|c| {
            let own = c.context.to_lowercase();
            let mut rank = u32::from(c.confidence);
            if context_lower.contains(&c.value.to_lowercase()) {
                rank += 40;
            }
            if term_filter && own.contains("filter") {
                rank += 20;
            }
            if term_oil && own.contains("oil") {
                rank += 20;
            }
            (rank, c)
        })
        .min_by_key(|(rank, _)| std::cmp::Reverse(*rank))
        .map(|(_, c)| c)
}
