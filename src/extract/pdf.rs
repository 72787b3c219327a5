// src/extract/pdf.rs
use lopdf::Document;
use thiserror::Error;
use tracing::{info, warn};

/// Marker placed between pages when they are concatenated.
pub const PAGE_BREAK: &str = "\n\u{000C}\n";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF loading failed: {0}")]
    Load(String),

    #[error("PDF contains no pages")]
    NoPages,
}

/// Page texts of one uploaded document, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocumentText {
    pages: Vec<String>,
}

impl RawDocumentText {
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined with [`PAGE_BREAK`].
    pub fn joined(&self) -> String {
        self.pages.join(PAGE_BREAK)
    }
}

/// Read page texts out of PDF bytes, stopping after `max_pages` if given.
///
/// A page whose text cannot be decoded contributes an empty string.
pub fn extract_text(pdf_bytes: &[u8], max_pages: Option<usize>) -> Result<RawDocumentText, PdfError> {
    let doc = Document::load_mem(pdf_bytes).map_err(|e| PdfError::Load(e.to_string()))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(PdfError::NoPages);
    }

    let limit = max_pages.unwrap_or(usize::MAX);
    let mut pages = Vec::with_capacity(page_numbers.len().min(limit));
    for page in page_numbers.into_iter().take(limit) {
        match doc.extract_text(&[page]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                warn!(page, error = %e, "page text extraction failed");
                pages.push(String::new());
            }
        }
    }

    info!(pages = pages.len(), "PDF text extracted");
    Ok(RawDocumentText::from_pages(pages))
}
