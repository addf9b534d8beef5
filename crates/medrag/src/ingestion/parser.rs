//! PDF text extraction, one entry per page

use crate::error::{Error, Result};

/// Text from a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Cleaned text content
    pub content: String,
}

/// PDF parser
pub struct PdfParser;

impl PdfParser {
    /// Extract non-blank pages from a PDF.
    ///
    /// Pages are read with lopdf; when no page yields text the whole document
    /// is run through pdf-extract and returned as page 1.
    pub fn extract_pages(filename: &str, data: &[u8]) -> Result<Vec<PageText>> {
        if data.is_empty() {
            return Err(Error::file_parse(filename, "File is empty"));
        }

        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut pages = collect_pages(filename, doc.get_pages().into_keys(), |page_number| {
            doc.extract_text(&[page_number])
        })?;

        if pages.is_empty() {
            tracing::warn!("{}: per-page extraction found no text, trying pdf-extract", filename);
            let content = pdf_extract::extract_text_from_mem(data)
                .map(|text| cleanup_text(&text))
                .map_err(|e| Error::file_parse(filename, e.to_string()))?;
            if content.is_empty() {
                return Err(Error::file_parse(
                    filename,
                    "PDF appears to be image-based or has no extractable text",
                ));
            }
            pages.push(PageText {
                page_number: 1,
                content,
            });
        }

        Ok(pages)
    }
}

/// Extract every page in order, skipping blank ones.
///
/// A page that cannot be read fails the whole file, so a document is never
/// indexed with pages missing.
fn collect_pages<E: std::fmt::Display>(
    filename: &str,
    page_numbers: impl IntoIterator<Item = u32>,
    mut extract: impl FnMut(u32) -> std::result::Result<String, E>,
) -> Result<Vec<PageText>> {
    let mut pages = Vec::new();
    for page_number in page_numbers {
        let text = extract(page_number).map_err(|e| {
            Error::file_parse(
                filename,
                format!("Failed to extract page {}: {}", page_number, e),
            )
        })?;
        let content = cleanup_text(&text);
        if content.is_empty() {
            tracing::debug!("{}: page {} has no text", filename, page_number);
        } else {
            pages.push(PageText {
                page_number,
                content,
            });
        }
    }
    Ok(pages)
}

/// Drop null characters, trim lines, and remove blank lines
fn cleanup_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
