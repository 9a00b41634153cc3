//! Page sources: where per-page text and tables come from.
//!
//! The engine never reads documents itself. A source hands it the output of
//! an extraction layer as a list of [`Page`]s.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ExtractError;
use crate::model::Page;

pub trait PageSource {
    fn load_pages(&self) -> Result<Vec<Page>, ExtractError>;
}

impl PageSource for Vec<Page> {
    fn load_pages(&self) -> Result<Vec<Page>, ExtractError> {
        Ok(self.clone())
    }
}

/// Pages numbered 0 are renumbered by position (1-based).
fn number_pages(mut pages: Vec<Page>) -> Vec<Page> {
    for (i, page) in pages.iter_mut().enumerate() {
        if page.page_number == 0 {
            page.page_number = i + 1;
        }
    }
    pages
}

// ---------------------------------------------------------------------------
// JSON page dump
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum DumpShape {
    Wrapped { pages: Vec<Page> },
    Bare(Vec<Page>),
}

/// JSON dump of an extraction run: `{"pages": [...]}` or a bare array of
/// `{page_number?, text, tables}` objects.
#[derive(Debug, Clone)]
pub struct JsonPageDump {
    pub path: PathBuf,
}

impl JsonPageDump {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(input: &str) -> Result<Vec<Page>, ExtractError> {
        let shape: DumpShape = serde_json::from_str(input)
            .map_err(|e| ExtractError::PageDump(e.to_string()))?;
        let pages = match shape {
            DumpShape::Wrapped { pages } => pages,
            DumpShape::Bare(pages) => pages,
        };
        Ok(number_pages(pages))
    }
}

impl PageSource for JsonPageDump {
    fn load_pages(&self) -> Result<Vec<Page>, ExtractError> {
        let input = fs::read_to_string(&self.path)
            .map_err(|e| ExtractError::Io(format!("{}: {e}", self.path.display())))?;
        Self::parse(&input).map_err(|e| match e {
            ExtractError::PageDump(msg) => {
                ExtractError::PageDump(format!("{}: {msg}", self.path.display()))
            }
            other => other,
        })
    }
}

// ---------------------------------------------------------------------------
// Plain text dump
// ---------------------------------------------------------------------------

/// Text-only pages separated by form feeds, as written by `pdftotext`.
#[derive(Debug, Clone)]
pub struct TextDump {
    pub path: PathBuf,
}

impl TextDump {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageSource for TextDump {
    fn load_pages(&self) -> Result<Vec<Page>, ExtractError> {
        let input = fs::read_to_string(&self.path)
            .map_err(|e| ExtractError::Io(format!("{}: {e}", self.path.display())))?;
        Ok(split_form_feed(&input))
    }
}

/// One page per `\x0c`-separated chunk. A trailing empty chunk (the usual
/// final form feed) is not a page.
pub fn split_form_feed(input: &str) -> Vec<Page> {
    let mut chunks: Vec<&str> = input.split('\x0c').collect();
    if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
        chunks.pop();
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page::text_only(i + 1, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn wrapped_dump_with_tables() {
        let pages = JsonPageDump::parse(
            r#"{"pages": [
                {"page_number": 1, "text": "Form 26AS", "tables": []},
                {"page_number": 2, "text": "", "tables": [[["1", null, "194C"]]]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].tables[0][0], vec![Some("1".into()), None, Some("194C".into())]);
    }

    #[test]
    fn bare_array_is_numbered_by_position() {
        let pages = JsonPageDump::parse(r#"[{"text": "a"}, {"text": "b"}]"#).unwrap();
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[1].page_number, 2);
        assert!(pages[1].tables.is_empty());
    }

    #[test]
    fn malformed_dump_is_page_dump_error() {
        let err = JsonPageDump::parse(r#"{"pages": 3}"#).unwrap_err();
        assert!(matches!(err, ExtractError::PageDump(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = JsonPageDump::new("/nonexistent/pages.json").load_pages().unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[test]
    fn form_feed_split_drops_trailing_page() {
        let pages = split_form_feed("page one\x0cpage two\x0c");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[1].text, "page two");
    }

    #[test]
    fn empty_text_is_one_empty_page() {
        let pages = split_form_feed("");
        assert_eq!(pages.len(), 1);
        assert!(pages[0].text.is_empty());
    }

    #[test]
    fn text_dump_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "first\x0csecond").unwrap();
        let pages = TextDump::new(file.path()).load_pages().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text, "first");
    }
}
