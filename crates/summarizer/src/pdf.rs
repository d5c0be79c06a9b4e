//! PDF text extraction module
//!
//! Extracts text content from in-memory PDF documents using lopdf.

use crate::errors::SummarizeError;
use tracing::{debug, warn};

/// Turns raw document bytes into plain text.
///
/// An empty string is a valid result (e.g. a scanned, image-only paper).
/// Only structurally unreadable input is an error.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, SummarizeError>;
}

/// lopdf-backed extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, SummarizeError> {
        extract_text_from_pdf(bytes)
    }
}

/// Extract text content from PDF bytes, page by page in document order
pub fn extract_text_from_pdf(bytes: &[u8]) -> Result<String, SummarizeError> {
    if bytes.is_empty() {
        return Err(SummarizeError::Extraction("document is empty".to_string()));
    }

    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| SummarizeError::Extraction(format!("Failed to load PDF: {}", e)))?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut text = String::new();
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    let cleaned = clean_text(&text);

    debug!(
        original_len = text.len(),
        cleaned_len = cleaned.len(),
        "Text extraction complete"
    );

    Ok(cleaned)
}

/// Normalise extracted text.
///
/// Collapses runs of whitespace within a line, drops blank lines, strips
/// byte-order marks and folds typographic quotes to ASCII. Line order is
/// preserved.
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .replace('\u{FEFF}', "")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}
