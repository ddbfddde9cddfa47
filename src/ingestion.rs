use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::{
    document::{Document, RawLine},
    error::{Error, Result},
};

/// Page separator emitted by text extractors.
const FORM_FEED: char = '\x0c';

#[derive(Debug, Deserialize)]
struct JsonDocument {
    name: Option<String>,
    pages: Vec<JsonPage>,
}

#[derive(Debug, Deserialize)]
struct JsonPage {
    /// Printed page number; must agree with the page's position when given.
    number: Option<usize>,
    #[serde(default)]
    lines: Vec<JsonLine>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonLine {
    Text(String),
    Positioned { text: String, y: Option<f32> },
}

impl From<JsonLine> for RawLine {
    fn from(line: JsonLine) -> Self {
        match line {
            JsonLine::Text(text) => RawLine { text, y: None },
            JsonLine::Positioned { text, y } => RawLine { text, y },
        }
    }
}

/// Build a document from extracted plain text.
///
/// Pages are separated by form feeds. A trailing empty page (extractors end
/// the last page with a form feed) is dropped.
pub fn parse_text(name: &str, content: &str) -> Document {
    let mut pages: Vec<&str> = content.split(FORM_FEED).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    if pages.len() == 1 && pages[0].trim().is_empty() {
        pages.clear();
    }
    Document::from_page_texts(name, &pages)
}

/// Build a document from its JSON page/line form.
pub fn parse_json(name: &str, content: &str) -> Result<Document> {
    let parsed: JsonDocument = serde_json::from_str(content)?;
    let name = parsed.name.unwrap_or_else(|| name.to_string());

    let declared: Vec<Option<usize>> = parsed.pages.iter().map(|p| p.number).collect();
    let mut document = Document::from_pages(name, parsed.pages.into_iter().map(|p| p.lines));

    for (page, number) in document.pages.iter_mut().zip(declared) {
        if let Some(number) = number {
            page.number = number;
        }
    }
    document.validate()?;
    Ok(document)
}

/// Load one document, picking the parser from the file extension.
pub fn load_document(path: &Path) -> Result<Document> {
    if !path.is_file() {
        return Err(Error::NotFound {
            kind: "document",
            name: path.display().to_string(),
        });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let document = match extension.as_deref() {
        Some("txt") => parse_text(&name, &std::fs::read_to_string(path)?),
        Some("json") => parse_json(&name, &std::fs::read_to_string(path)?)?,
        _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    };

    debug!(
        document = %document.name,
        pages = document.page_count(),
        lines = document.total_lines(),
        "loaded document"
    );
    Ok(document)
}

/// Load several documents in parallel. The first failure aborts the load.
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    paths.par_iter().map(|p| load_document(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_pages_split_on_form_feed() {
        let doc = parse_text("m.txt", "INDEX\nOil filter . . . 2\x0cENGINE\nOil filter RE504836\x0c");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[1].lines[1].text, "Oil filter RE504836");
        assert_eq!(doc.pages[1].lines[1].y, 12.0);
    }

    #[test]
    fn blank_text_is_an_empty_document() {
        assert!(parse_text("e.txt", "  \n").is_empty());
        assert_eq!(parse_text("e.txt", "").page_count(), 0);
    }

    #[test]
    fn json_lines_may_be_plain_or_positioned() {
        let json = r#"{
            "pages": [
                { "lines": ["FILTERS", { "text": "Air cleaner AT332908", "y": 140.5 }] },
                { "lines": [{ "text": "Seat" }] }
            ]
        }"#;
        let doc = parse_json("m.json", json).unwrap();
        assert_eq!(doc.name, "m.json");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].lines[0].y, 0.0);
        assert_eq!(doc.pages[0].lines[1].y, 140.5);
        assert_eq!(doc.pages[0].lines[0].next_text, "Air cleaner AT332908");
        assert_eq!(doc.pages[1].lines[0].y, 0.0);
    }

    #[test]
    fn json_name_overrides_file_name() {
        let doc = parse_json("m.json", r#"{ "name": "TM1234", "pages": [] }"#).unwrap();
        assert_eq!(doc.name, "TM1234");
        assert!(doc.is_empty());
    }

    #[test]
    fn json_page_numbers_must_be_contiguous() {
        let ok = r#"{ "pages": [ { "number": 1, "lines": [] }, { "number": 2 } ] }"#;
        assert!(parse_json("m.json", ok).is_ok());

        let gap = r#"{ "pages": [ { "number": 1, "lines": [] }, { "number": 7 } ] }"#;
        assert!(matches!(
            parse_json("m.json", gap),
            Err(Error::InvalidDocument(_))
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(parse_json("m.json", "{"), Err(Error::Json(_))));
    }

    #[test]
    fn load_by_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let txt = tmp.path().join("manual.txt");
        let json = tmp.path().join("parts.JSON");
        let pdf = tmp.path().join("manual.pdf");
        std::fs::write(&txt, "Engine oil filter\x0cSeat").unwrap();
        std::fs::write(&json, r#"{ "pages": [ { "lines": ["Fuel filter"] } ] }"#).unwrap();
        std::fs::write(&pdf, "%PDF-1.7").unwrap();

        let docs = load_documents(&[txt.clone(), json.clone()]).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "manual.txt");
        assert_eq!(docs[0].page_count(), 2);
        assert_eq!(docs[1].name, "parts.JSON");

        assert!(matches!(
            load_document(&pdf),
            Err(Error::UnsupportedFormat(p)) if p == pdf
        ));
        assert!(matches!(
            load_documents(&[txt, tmp.path().join("missing.txt")]),
            Err(Error::NotFound { kind: "document", name }) if name.ends_with("missing.txt")
        ));
        assert!(matches!(
            load_document(tmp.path()),
            Err(Error::NotFound { .. })
        ));
    }
}
