//! PDF adapter: per-page text via lopdf, whole-document fallback via pdf-extract

use std::path::Path;

use crate::error::{Error, Result};

use super::adapters::{base_metadata, DocumentAdapter, LoadedDocument, TextSegment};

/// Portable Document Format files
pub struct PdfAdapter;

impl PdfAdapter {
    fn load_pages(path: &Path) -> Option<Vec<TextSegment>> {
        let doc = lopdf::Document::load(path).ok()?;
        let base = base_metadata(path, "pdf");

        let mut segments = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => {
                    let mut metadata = base.clone();
                    metadata.insert("page".to_string(), page_number.to_string());
                    segments.push(TextSegment { text, metadata });
                }
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        page = page_number,
                        error = %e,
                        "Per-page extraction failed"
                    );
                    return None;
                }
            }
        }

        if segments.iter().all(|s| s.text.trim().is_empty()) {
            return None;
        }
        Some(segments)
    }
}

impl DocumentAdapter for PdfAdapter {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        if let Some(segments) = Self::load_pages(path) {
            return Ok(LoadedDocument::Text(segments));
        }

        let text =
            pdf_extract::extract_text(path).map_err(|e| Error::adapter(path, e.to_string()))?;

        Ok(LoadedDocument::Text(vec![TextSegment {
            text,
            metadata: base_metadata(path, "pdf"),
        }]))
    }
}
