use std::io::{Cursor, Read};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use zip::ZipArchive;

use crate::application::ports::{ExtractionError, FileLoader};
use crate::domain::ContentType;

static TEXT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").unwrap());
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:p(?:\s[^>]*)?>.*?</w:p>").unwrap());
static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:tbl(?:\s[^>]*)?>.*?</w:tbl>").unwrap());
static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:tr(?:\s[^>]*)?>.*?</w:tr>").unwrap());
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<w:tc(?:\s[^>]*)?>.*?</w:tc>").unwrap());

/// Extracts text from the Office Open XML word document container:
/// body paragraphs in document order, then table contents cell by cell.
#[derive(Default)]
pub struct DocxAdapter;

impl DocxAdapter {
    pub fn new() -> Self {
        Self
    }

    fn read_document_xml(data: &[u8]) -> Result<String, ExtractionError> {
        let mut archive = ZipArchive::new(Cursor::new(data.to_vec())).map_err(|e| {
            ExtractionError::ExtractionFailed(format!("failed to open DOCX archive: {e}"))
        })?;

        let mut entry = archive.by_name("word/document.xml").map_err(|_| {
            ExtractionError::ExtractionFailed("missing word/document.xml".to_string())
        })?;

        let mut xml = String::new();
        entry.read_to_string(&mut xml).map_err(|e| {
            ExtractionError::ExtractionFailed(format!("failed to read document body: {e}"))
        })?;
        Ok(xml)
    }

    fn text_of_runs(fragment: &str) -> String {
        let mut text = String::new();
        for caps in TEXT_RUN.captures_iter(fragment) {
            unescape_into(&caps[1], &mut text);
        }
        text
    }
}

#[async_trait]
impl FileLoader for DocxAdapter {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn extract_text(
        &self,
        data: &[u8],
        content_type: ContentType,
    ) -> Result<String, ExtractionError> {
        if content_type != ContentType::Docx {
            return Err(ExtractionError::UnsupportedFormat(
                content_type.as_mime().to_string(),
            ));
        }

        let xml = Self::read_document_xml(data)?;

        // Tables are pulled out first so body paragraphs exclude cell
        // paragraphs; their contents are appended after the body.
        let mut tables: Vec<String> = Vec::new();
        let body = TABLE.replace_all(&xml, |caps: &regex::Captures<'_>| {
            tables.push(caps[0].to_string());
            String::new()
        });

        let mut text = String::new();
        for paragraph in PARAGRAPH.find_iter(&body) {
            text.push_str(&Self::text_of_runs(paragraph.as_str()));
            text.push('\n');
        }

        for table in &tables {
            for row in ROW.find_iter(table) {
                let cells: Vec<String> = CELL
                    .find_iter(row.as_str())
                    .map(|cell| Self::text_of_runs(cell.as_str()))
                    .collect();
                text.push_str(&cells.join(" "));
                text.push('\n');
            }
        }

        tracing::info!(table_count = tables.len(), "DOCX text extraction complete");

        Ok(text)
    }
}

fn unescape_into(escaped: &str, out: &mut String) {
    let mut rest = escaped;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let (replacement, consumed) = if rest.starts_with("&amp;") {
            ('&', 5)
        } else if rest.starts_with("&lt;") {
            ('<', 4)
        } else if rest.starts_with("&gt;") {
            ('>', 4)
        } else if rest.starts_with("&quot;") {
            ('"', 6)
        } else if rest.starts_with("&apos;") {
            ('\'', 6)
        } else {
            ('&', 1)
        };
        out.push(replacement);
        rest = &rest[consumed..];
    }
    out.push_str(rest);
}
