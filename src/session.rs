//! Conversational follow-ups across queries.
//!
//! The session is plain data owned by the caller. A search never mutates it;
//! it returns a [`SessionDelta`] that the caller folds in with
//! [`SessionContext::apply`].

use serde::Serialize;
use tracing::debug;

use crate::{
    config::SearchConfig,
    document::Document,
    query::normalize_query,
    search::{SearchResult, find_parts},
};

/// Words that point back at the previous subject.
const REFERRING_WORDS: &[&str] = &["it", "its", "it's", "that", "this", "same", "them"];

/// Words that may accompany a referring word without naming a new subject.
const FOLLOW_UP_WORDS: &[&str] = &[
    "one", "where", "is", "was", "what", "which", "page", "on", "the", "part", "number", "again",
    "show", "me", "find", "located", "location", "for", "of", "and", "please",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Number of queries answered so far.
    pub turn: usize,
    pub last_query: Option<String>,
    /// Canonical component phrase of the last query.
    pub last_component: Option<String>,
    /// Part number of the last query's top result.
    pub last_part_number: Option<String>,
}

/// What one query adds to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDelta {
    pub query: String,
    pub component: String,
    pub part_number: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The query to actually run.
    ///
    /// A follow-up such as "what page is it on" is replaced by the
    /// remembered component phrase. Anything else passes through.
    pub fn effective_query(&self, query: &str) -> String {
        match &self.last_component {
            Some(component) if is_follow_up(query) => component.clone(),
            _ => query.to_string(),
        }
    }

    pub fn apply(&mut self, delta: SessionDelta) {
        self.turn += 1;
        self.last_query = Some(delta.query);
        if !delta.component.is_empty() {
            self.last_component = Some(delta.component);
        }
        if delta.part_number.is_some() {
            self.last_part_number = delta.part_number;
        }
    }
}

/// True if the query only refers back to an earlier subject.
pub fn is_follow_up(query: &str) -> bool {
    let lower = query.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || matches!(c, '?' | '!' | '.' | ','))
        .filter(|w| !w.is_empty())
        .collect();

    !words.is_empty()
        && words.iter().any(|w| REFERRING_WORDS.contains(w))
        && words
            .iter()
            .all(|w| REFERRING_WORDS.contains(w) || FOLLOW_UP_WORDS.contains(w))
}

/// Run one query in the context of a session.
pub fn search_in_session(
    session: &SessionContext,
    documents: &[Document],
    query: &str,
    config: &SearchConfig,
) -> (Vec<SearchResult>, SessionDelta) {
    let effective = session.effective_query(query);
    if effective != query {
        debug!(turn = session.turn, query, rewritten = %effective, "follow-up query");
    }

    let results = find_parts(documents, &effective, config);
    let delta = SessionDelta {
        query: query.to_string(),
        component: normalize_query(&effective),
        part_number: results.first().and_then(|r| r.part_number.clone()),
    };
    (results, delta)
}
