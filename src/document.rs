//! Page/line model of an extracted technical document.
//!
//! A [`Document`] is built once from per-page line text and is read-only
//! afterwards. Page numbers are always contiguous starting at 1, and every
//! [`Line`] knows the text of its neighbours so context windows can be built
//! without going back to the page.

use serde::{Deserialize, Serialize};

/// Vertical distance between synthesized line positions.
pub const DEFAULT_LINE_HEIGHT: f32 = 12.0;

/// Maximum characters of a page's first line used as its section label.
const SECTION_LABEL_MAX_CHARS: usize = 60;

/// A single line of text on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// 1-based position within the page, top to bottom.
    pub number: usize,
    pub text: String,
    /// Vertical position on the page.
    pub y: f32,
    /// Text of the line directly above (empty on the first line).
    pub previous_text: String,
    /// Text of the line directly below (empty on the last line).
    pub next_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub lines: Vec<Line>,
}

impl Page {
    /// All line text joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Look up a line by its 1-based number.
    pub fn line(&self, number: usize) -> Option<&Line> {
        number.checked_sub(1).and_then(|idx| self.lines.get(idx))
    }

    /// The first non-empty line, used as a coarse section label.
    pub fn section_label(&self) -> Option<String> {
        self.lines
            .iter()
            .map(|l| l.text.trim())
            .find(|t| !t.is_empty())
            .map(|t| {
                crate::text_util::truncate_chars(t, SECTION_LABEL_MAX_CHARS)
                    .to_string()
            })
    }
}

/// Flattened, borrowed view of one line, used for linear scans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineIndexEntry<'a> {
    pub text: &'a str,
    pub page_number: usize,
    pub line_number: usize,
    pub y: f32,
    pub previous_text: &'a str,
    pub next_text: &'a str,
}

/// A document as an ordered list of pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Display name, usually the source file name.
    pub name: String,
    pub pages: Vec<Page>,
}

/// A line as handed over by an extractor: text plus an optional position.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub text: String,
    pub y: Option<f32>,
}

impl From<&str> for RawLine {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
            y: None,
        }
    }
}

impl From<String> for RawLine {
    fn from(text: String) -> Self {
        Self { text, y: None }
    }
}

impl Document {
    /// Build a document from per-page lines.
    ///
    /// Pages are numbered from 1 in the order given. A line holding embedded
    /// newlines is split into one line per row. Lines without a position get
    /// one synthesized from their index.
    pub fn from_pages<P, L>(name: impl Into<String>, pages: P) -> Self
    where
        P: IntoIterator,
        P::Item: IntoIterator<Item = L>,
        L: Into<RawLine>,
    {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(page_idx, raw)| {
                let raw: Vec<RawLine> = raw
                    .into_iter()
                    .flat_map(|l| split_rows(l.into()))
                    .collect();
                build_page(page_idx + 1, &raw)
            })
            .collect();

        Self {
            name: name.into(),
            pages,
        }
    }

    /// Build a document from plain text, one string per page.
    pub fn from_page_texts<S: AsRef<str>>(
        name: impl Into<String>,
        pages: &[S],
    ) -> Self {
        Self::from_pages(
            name,
            pages
                .iter()
                .map(|p| p.as_ref().lines().map(RawLine::from).collect::<Vec<_>>()),
        )
    }

    /// Look up a page by its 1-based number.
    ///
    /// Out-of-range numbers yield `None` rather than an error.
    pub fn page(&self, number: usize) -> Option<&Page> {
        number.checked_sub(1).and_then(|idx| self.pages.get(idx))
    }

    /// Look up a single line.
    pub fn line(&self, page_number: usize, line_number: usize) -> Option<&Line> {
        self.page(page_number).and_then(|p| p.line(line_number))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn total_lines(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_lines() == 0
    }

    /// Every line of every page in document order.
    pub fn line_index(&self) -> impl Iterator<Item = LineIndexEntry<'_>> {
        self.pages.iter().flat_map(|page| {
            page.lines.iter().map(move |line| LineIndexEntry {
                text: &line.text,
                page_number: page.number,
                line_number: line.number,
                y: line.y,
                previous_text: &line.previous_text,
                next_text: &line.next_text,
            })
        })
    }

    /// Check the structural invariants of a deserialized document.
    pub fn validate(&self) -> crate::Result<()> {
        for (idx, page) in self.pages.iter().enumerate() {
            if page.number != idx + 1 {
                return Err(crate::Error::InvalidDocument(format!(
                    "{}: page at position {} is numbered {}",
                    self.name,
                    idx + 1,
                    page.number
                )));
            }
            for (line_idx, line) in page.lines.iter().enumerate() {
                if line.number != line_idx + 1 {
                    return Err(crate::Error::InvalidDocument(format!(
                        "{}: page {} line at position {} is numbered {}",
                        self.name,
                        page.number,
                        line_idx + 1,
                        line.number
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Split a line carrying embedded newlines into one line per row.
///
/// Rows after the first sit one line height below a given position.
fn split_rows(line: RawLine) -> Vec<RawLine> {
    if !line.text.contains('\n') {
        return vec![line];
    }
    line.text
        .split('\n')
        .enumerate()
        .map(|(row, text)| RawLine {
            text: text.strip_suffix('\r').unwrap_or(text).to_string(),
            y: line.y.map(|y| y + row as f32 * DEFAULT_LINE_HEIGHT),
        })
        .collect()
}

fn build_page(number: usize, raw: &[RawLine]) -> Page {
    let lines = raw
        .iter()
        .enumerate()
        .map(|(idx, line)| Line {
            number: idx + 1,
            text: line.text.clone(),
            y: line.y.unwrap_or(idx as f32 * DEFAULT_LINE_HEIGHT),
            previous_text: idx
                .checked_sub(1)
                .map(|p| raw[p].text.clone())
                .unwrap_or_default(),
            next_text: raw
                .get(idx + 1)
                .map(|n| n.text.clone())
                .unwrap_or_default(),
        })
        .collect();

    Page { number, lines }
}
