//! partseek - find orderable part numbers in extracted technical manuals.
//!
//! partseek takes documents already split into pages and lines, turns a
//! free-text question into a canonical component phrase, scans for candidate
//! lines under fixed work budgets, scores them with intent-specific rules and
//! follows index or table-of-contents hits to the page that actually lists
//! the part.
//!
//! # Quick start
//!
//! ```
//! use partseek::{Document, SearchConfig, search};
//!
//! let manual = Document::from_page_texts(
//!     "manual.txt",
//!     &["LUBRICATION\nEngine oil filter element RE504836\nDrain plug"],
//! );
//!
//! let results = search::find_parts(&[manual], "where is the engine oil filter?", &SearchConfig::default());
//! assert_eq!(results[0].part_number.as_deref(), Some("RE504836"));
//! for r in &results {
//!     println!("{} p.{} (score: {})", r.name, r.location.page_number, r.score);
//! }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod identifier;
pub mod ingestion;
pub mod navigation;
pub mod query;
pub mod rules;
pub mod search;
pub mod session;
pub mod text_util;

pub use config::SearchConfig;
pub use document::Document;
pub use error::{Error, Result};
pub use search::{SearchResult, find_parts};
pub use session::SessionContext;
