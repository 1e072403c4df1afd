//! Word (.docx) adapter

use std::path::Path;

use crate::error::{Error, Result};

use super::adapters::{base_metadata, DocumentAdapter, LoadedDocument, TextSegment};

/// Office Open XML word-processing documents
pub struct DocxAdapter;

impl DocumentAdapter for DocxAdapter {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extensions(&self) -> &[&'static str] {
        &["docx"]
    }

    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        let data = std::fs::read(path).map_err(|e| Error::adapter(path, e.to_string()))?;
        let doc = docx_rs::read_docx(&data).map_err(|e| Error::adapter(path, e.to_string()))?;

        let mut text = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                text.push_str(&t.text);
                            }
                        }
                    }
                }
                text.push('\n');
            }
        }

        Ok(LoadedDocument::Text(vec![TextSegment {
            text,
            metadata: base_metadata(path, "docx"),
        }]))
    }
}
