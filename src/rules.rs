//! Relevance scoring rules keyed by query intent.
//!
//! Each rule is a pure function from a [`RuleInput`] to a score delta. The
//! intent detected from the normalized query selects a rule table; the
//! generic table always applies on top. A separate, stricter gate
//! ([`is_relevant_for_query`]) can reject a context before it is scored.

use tracing::trace;

use crate::{identifier, text_util::contains_any};

/// Maximum distance in characters between "air" and a filter word in an
/// air-filter context.
pub const AIR_FILTER_PROXIMITY: usize = 50;

const FILTER_TERMS: &[&str] = &["filter", "element", "cleaner", "cartridge", "strainer"];

const ENGINE_AIR_TERMS: &[&str] = &["engine", "intake", "primary"];

const HVAC_TERMS: &[&str] = &[
    "condenser",
    "evaporator",
    "operator station",
    "hvac",
    "air conditioning",
];

const AIR_EXCLUSIONS: &[&str] = &[
    "condenser",
    "evaporator",
    "operator station",
    "hvac",
    "air conditioning",
    "refrigerant",
    "recirculation",
    "fresh air",
    "cab filter",
    "cabin filter",
    "heater",
];

const OTHER_FLUID_TERMS: &[&str] = &["fuel", "hydraulic", "oil"];

const OIL_TERMS: &[&str] = &["oil", "lube"];

const OIL_EXCLUSIONS: &[&str] = &["fuel filter", "air filter", "air cleaner", "coolant"];

const TRANSMISSION_TERMS: &[&str] = &["transmission", "gearbox", "powershift", "housing cover"];

const OIL_ELEMENT_TERMS: &[&str] = &["spin-on", "spin on", "cartridge", "element"];

const FUEL_EXCLUSIONS: &[&str] = &[
    "air filter",
    "air cleaner",
    "hydraulic",
    "oil filter",
    "lube",
];

const COMPONENT_TERMS: &[&str] = &["element", "assembly", "kit", "service", "cartridge", "housing"];

const INDEX_TERMS: &[&str] = &["alphabetical", "index"];

/// Which part of the machine an oil query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OilScope {
    Engine,
    Transmission,
    Unspecified,
}

/// What the query is looking for, as far as the rule tables care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    AirFilter,
    OilFilter(OilScope),
    FuelFilter,
    General,
}

impl QueryIntent {
    /// Detect the intent of a (normalized) query.
    pub fn detect(query: &str) -> Self {
        let q = query.to_lowercase();
        let names_filter = contains_any(&q, FILTER_TERMS);
        let names_transmission = contains_any(&q, TRANSMISSION_TERMS);

        if q.contains("air") && names_filter {
            Self::AirFilter
        } else if q.contains("fuel") && names_filter {
            Self::FuelFilter
        } else if contains_any(&q, OIL_TERMS) || (names_transmission && names_filter) {
            let scope = if names_transmission {
                OilScope::Transmission
            } else if q.contains("engine") {
                OilScope::Engine
            } else {
                OilScope::Unspecified
            };
            Self::OilFilter(scope)
        } else {
            Self::General
        }
    }

    /// The intent-specific rule table.
    pub fn rules(self) -> &'static [ScoreRule] {
        match self {
            Self::AirFilter => AIR_FILTER_RULES,
            Self::OilFilter(_) => OIL_FILTER_RULES,
            Self::FuelFilter | Self::General => &[],
        }
    }

    /// Hard relevance gate. Both inputs must be lower-case.
    fn admits(self, context: &str, query: &str) -> bool {
        match self {
            Self::AirFilter => admits_air_filter(context),
            Self::OilFilter(scope) => admits_oil_filter(context, query, scope),
            Self::FuelFilter => admits_fuel_filter(context),
            Self::General => true,
        }
    }
}

/// Inputs every rule sees.
#[derive(Debug, Clone)]
pub struct RuleInput<'a> {
    /// Context window as found in the document.
    pub raw: &'a str,
    /// Lower-cased context window.
    pub context: String,
    /// Lower-cased normalized query.
    pub query: String,
}

impl<'a> RuleInput<'a> {
    pub fn new(context: &'a str, query: &str) -> Self {
        Self {
            raw: context,
            context: context.to_lowercase(),
            query: query.to_lowercase(),
        }
    }
}

/// A named scoring rule.
#[derive(Clone, Copy)]
pub struct ScoreRule {
    pub name: &'static str,
    pub delta: fn(&RuleInput<'_>) -> i32,
}

impl std::fmt::Debug for ScoreRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreRule").field("name", &self.name).finish()
    }
}

pub const AIR_FILTER_RULES: &[ScoreRule] = &[
    ScoreRule {
        name: "engine_intake_air",
        delta: engine_intake_air,
    },
    ScoreRule {
        name: "hvac_air",
        delta: hvac_air,
    },
    ScoreRule {
        name: "other_fluid_system",
        delta: other_fluid_system,
    },
];

pub const OIL_FILTER_RULES: &[ScoreRule] = &[
    ScoreRule {
        name: "oil_filter_pairing",
        delta: oil_filter_pairing,
    },
    ScoreRule {
        name: "engine_oil_transmission",
        delta: engine_oil_transmission,
    },
    ScoreRule {
        name: "oil_element_type",
        delta: oil_element_type,
    },
];

pub const GENERIC_RULES: &[ScoreRule] = &[
    ScoreRule {
        name: "component_terms",
        delta: component_terms,
    },
    ScoreRule {
        name: "index_terms",
        delta: index_terms,
    },
    ScoreRule {
        name: "external_fuel_for_air",
        delta: external_fuel_for_air,
    },
    ScoreRule {
        name: "short_context",
        delta: short_context,
    },
    ScoreRule {
        name: "part_number_present",
        delta: part_number_present,
    },
];

fn engine_intake_air(input: &RuleInput<'_>) -> i32 {
    if contains_any(&input.context, ENGINE_AIR_TERMS) { 8 } else { 0 }
}

fn hvac_air(input: &RuleInput<'_>) -> i32 {
    if contains_any(&input.context, HVAC_TERMS) { -15 } else { 0 }
}

fn other_fluid_system(input: &RuleInput<'_>) -> i32 {
    if contains_any(&input.context, OTHER_FLUID_TERMS) { -5 } else { 0 }
}

fn oil_filter_pairing(input: &RuleInput<'_>) -> i32 {
    let ctx = &input.context;
    if contains_any(ctx, OIL_TERMS)
        && ctx.contains("filter")
        && !ctx.contains("transmission")
    {
        10
    } else {
        0
    }
}

fn engine_oil_transmission(input: &RuleInput<'_>) -> i32 {
    if input.query.contains("engine oil") && contains_any(&input.context, TRANSMISSION_TERMS) {
        -20
    } else {
        0
    }
}

fn oil_element_type(input: &RuleInput<'_>) -> i32 {
    if contains_any(&input.context, OIL_ELEMENT_TERMS) { 3 } else { 0 }
}

fn component_terms(input: &RuleInput<'_>) -> i32 {
    COMPONENT_TERMS
        .iter()
        .filter(|t| input.context.contains(*t))
        .count() as i32
}

fn index_terms(input: &RuleInput<'_>) -> i32 {
    if contains_any(&input.context, INDEX_TERMS) { -3 } else { 0 }
}

fn external_fuel_for_air(input: &RuleInput<'_>) -> i32 {
    if input.context.contains("external fuel") && input.query.contains("air") {
        -4
    } else {
        0
    }
}

fn short_context(input: &RuleInput<'_>) -> i32 {
    if input.raw.chars().count() < 20 { -1 } else { 0 }
}

fn part_number_present(input: &RuleInput<'_>) -> i32 {
    if identifier::contains_part_number(input.raw) { 2 } else { 0 }
}

/// Score a context window for a normalized query and its term set.
///
/// +1 per term found, then every rule of the query's intent table and the
/// generic table. The result may be negative.
pub fn score_context<S: AsRef<str>>(context: &str, query: &str, terms: &[S]) -> i32 {
    let input = RuleInput::new(context, query);
    let base = terms
        .iter()
        .filter(|t| {
            let t = t.as_ref().to_lowercase();
            !t.is_empty() && input.context.contains(&t)
        })
        .count() as i32;

    let intent = QueryIntent::detect(query);
    let adjustments: i32 = intent
        .rules()
        .iter()
        .chain(GENERIC_RULES)
        .map(|rule| {
            let delta = (rule.delta)(&input);
            if delta != 0 {
                trace!(rule = rule.name, delta, "score rule fired");
            }
            delta
        })
        .sum();

    base + adjustments
}

/// Hard gate run before scoring for air, oil and fuel filter queries.
pub fn is_relevant_for_query(context: &str, query: &str) -> bool {
    let ctx = context.to_lowercase();
    let q = query.to_lowercase();
    QueryIntent::detect(&q).admits(&ctx, &q)
}

fn admits_air_filter(ctx: &str) -> bool {
    if contains_any(ctx, AIR_EXCLUSIONS) {
        return false;
    }
    if !ctx.contains("air") || !contains_any(ctx, FILTER_TERMS) {
        return false;
    }
    nearest_distance(ctx, &["air"], FILTER_TERMS)
        .is_some_and(|d| d <= AIR_FILTER_PROXIMITY)
}

fn admits_oil_filter(ctx: &str, query: &str, scope: OilScope) -> bool {
    if contains_any(ctx, OIL_EXCLUSIONS) {
        return false;
    }
    if contains_any(query, FILTER_TERMS) && !contains_any(ctx, FILTER_TERMS) {
        return false;
    }
    match scope {
        OilScope::Engine => {
            contains_any(ctx, OIL_TERMS) && !contains_any(ctx, TRANSMISSION_TERMS)
        }
        OilScope::Transmission => contains_any(ctx, TRANSMISSION_TERMS),
        OilScope::Unspecified => {
            contains_any(ctx, OIL_TERMS) && !ctx.contains("hydraulic")
        }
    }
}

fn admits_fuel_filter(ctx: &str) -> bool {
    !contains_any(ctx, FUEL_EXCLUSIONS)
        && ctx.contains("fuel")
        && contains_any(ctx, FILTER_TERMS)
}

/// Smallest distance between an occurrence of any `a` term and any `b` term.
fn nearest_distance(text: &str, a: &[&str], b: &[&str]) -> Option<usize> {
    let positions = |terms: &[&str]| -> Vec<usize> {
        terms
            .iter()
            .flat_map(|t| text.match_indices(t).map(|(i, _)| i))
            .collect()
    };
    let left = positions(a);
    let right = positions(b);

    left.iter()
        .flat_map(|l| right.iter().map(move |r| l.abs_diff(*r)))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::query_terms;

    fn score(context: &str, query: &str) -> i32 {
        let qt = query_terms(query);
        score_context(context, &qt.canonical, &qt.terms)
    }

    #[test]
    fn detects_intents() {
        assert_eq!(QueryIntent::detect("air filter"), QueryIntent::AirFilter);
        assert_eq!(QueryIntent::detect("fuel filter"), QueryIntent::FuelFilter);
        assert_eq!(
            QueryIntent::detect("engine oil filter"),
            QueryIntent::OilFilter(OilScope::Engine)
        );
        assert_eq!(
            QueryIntent::detect("engine oil"),
            QueryIntent::OilFilter(OilScope::Engine)
        );
        assert_eq!(
            QueryIntent::detect("transmission filter"),
            QueryIntent::OilFilter(OilScope::Transmission)
        );
        assert_eq!(
            QueryIntent::detect("oil filter"),
            QueryIntent::OilFilter(OilScope::Unspecified)
        );
        assert_eq!(QueryIntent::detect("starter motor"), QueryIntent::General);
    }

    #[test]
    fn base_score_counts_terms() {
        // "starter", "motor"; long enough to avoid the short penalty
        assert_eq!(score("Starter motor mounting bolts", "starter motor"), 2);
    }

    #[test]
    fn short_context_penalty() {
        assert_eq!(score("Starter motor", "starter motor"), 1);
    }

    #[test]
    fn air_filter_engine_beats_hvac() {
        let engine = score("Engine air intake filter, RE12345", "air filter");
        let hvac = score(
            "Condenser air filter for operator station AH212121",
            "air filter",
        );
        assert!(engine >= 3, "engine score {engine}");
        assert!(hvac < engine);
        assert!(hvac < 3, "hvac score {hvac}");
    }

    #[test]
    fn engine_oil_transmission_never_passes() {
        let ctx = "Engine oil filter element kit assembly for transmission housing \
                   RE508960 service cartridge spin-on";
        let s = score(ctx, "engine oil");
        assert!(s < 3, "score {s}");
        let s = score(ctx, "engine oil filter");
        assert!(s < 3, "score {s}");
    }

    #[test]
    fn oil_filter_pairing_bonus() {
        let with = score("Engine oil filter, spin-on, RE504836", "engine oil filter");
        let without = score("Engine oil dipstick tube assembly", "engine oil filter");
        assert!(with >= without + 10);
    }

    #[test]
    fn external_fuel_penalised_for_air() {
        let input = RuleInput::new("External fuel line air bleed", "air filter");
        assert_eq!(external_fuel_for_air(&input), -4);
        let input = RuleInput::new("External fuel line air bleed", "fuel filter");
        assert_eq!(external_fuel_for_air(&input), 0);
    }

    #[test]
    fn every_rule_is_independent() {
        let input = RuleInput::new(
            "Alphabetical index: element housing kit AT1234",
            "bracket",
        );
        assert_eq!(component_terms(&input), 3);
        assert_eq!(index_terms(&input), -3);
        assert_eq!(part_number_present(&input), 2);
        assert_eq!(short_context(&input), 0);
    }

    #[test]
    fn gate_rejects_hvac_air_filter() {
        assert!(!is_relevant_for_query(
            "Condenser air filter, operator station",
            "air filter"
        ));
        assert!(is_relevant_for_query(
            "Engine air intake filter, RE12345",
            "air filter"
        ));
    }

    #[test]
    fn gate_requires_air_near_filter() {
        let far = format!("Air {} filter", "x".repeat(60));
        assert!(!is_relevant_for_query(&far, "air filter"));
        assert!(!is_relevant_for_query("Engine air intake hose", "air filter"));
    }

    #[test]
    fn gate_splits_engine_and_transmission_oil() {
        let trans = "Transmission oil filter RE123456";
        let engine = "Engine oil filter RE504836";
        assert!(!is_relevant_for_query(trans, "engine oil filter"));
        assert!(is_relevant_for_query(engine, "engine oil filter"));
        assert!(is_relevant_for_query(trans, "transmission filter"));
        assert!(!is_relevant_for_query(engine, "transmission filter"));
    }

    #[test]
    fn gate_requires_filter_word_only_when_query_has_one() {
        assert!(is_relevant_for_query("Engine oil, SAE 15W-40", "engine oil"));
        assert!(!is_relevant_for_query("Engine oil, SAE 15W-40", "engine oil filter"));
    }

    #[test]
    fn gate_for_fuel_filter() {
        assert!(is_relevant_for_query("Primary fuel filter element", "fuel filter"));
        assert!(!is_relevant_for_query("Hydraulic fuel filter", "fuel filter"));
        assert!(!is_relevant_for_query("Fuel tank cap", "fuel filter"));
    }

    #[test]
    fn general_queries_are_not_gated() {
        assert!(is_relevant_for_query("anything at all", "starter motor"));
    }

    #[test]
    fn nearest_distance_finds_closest_pair() {
        assert_eq!(
            nearest_distance("air ... filter air filter", &["air"], &["filter"]),
            Some(4)
        );
        assert_eq!(nearest_distance("air", &["air"], &["filter"]), None);
    }
}
