//! Format adapters: turn a file into text segments or tabular rows

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::{DecodingConfig, RagConfig, TabularConfig};
use crate::error::{Error, Result};
use crate::types::Metadata;

use super::decode::decode_text;
use super::tabular::is_null_value;

/// A run of text from one location in a document (a page, or the whole file)
#[derive(Debug, Clone)]
pub struct TextSegment {
    pub text: String,
    pub metadata: Metadata,
}

/// One data row of a tabular source with null fields already removed
#[derive(Debug, Clone)]
pub struct TabularRow {
    /// 1-based data row number
    pub number: usize,
    /// Column name and value pairs in column order
    pub fields: Vec<(String, String)>,
    pub metadata: Metadata,
}

/// Everything an adapter extracted from one file
#[derive(Debug, Clone)]
pub enum LoadedDocument {
    Text(Vec<TextSegment>),
    Rows(Vec<TabularRow>),
}

/// Reads one file format
pub trait DocumentAdapter: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &'static str;

    /// Lowercase file extensions handled, without the dot
    fn extensions(&self) -> &[&'static str];

    /// Load a file
    fn load(&self, path: &Path) -> Result<LoadedDocument>;
}

/// Metadata every adapter attaches: `source` (file name) and `file_type`
pub fn base_metadata(path: &Path, file_type: &str) -> Metadata {
    let mut metadata = Metadata::new();
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    metadata.insert("source".to_string(), source);
    metadata.insert("file_type".to_string(), file_type.to_string());
    metadata
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::adapter(path, e.to_string()))
}

/// Extension to adapter lookup, built once per session
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn DocumentAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter enabled by cargo features
    pub fn with_defaults(config: &RagConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextAdapter::new(config.decoding.clone())));
        registry.register(Arc::new(CsvAdapter::new(
            config.tabular.clone(),
            config.decoding.clone(),
        )));
        #[cfg(feature = "pdf")]
        registry.register(Arc::new(super::pdf::PdfAdapter));
        #[cfg(feature = "docx")]
        registry.register(Arc::new(super::docx::DocxAdapter));
        registry
    }

    /// Register an adapter for all of its extensions, replacing earlier ones
    pub fn register(&mut self, adapter: Arc<dyn DocumentAdapter>) {
        for ext in adapter.extensions() {
            self.adapters.insert(ext.to_string(), Arc::clone(&adapter));
        }
    }

    /// Adapter for a path, by lowercase extension
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn DocumentAdapter>> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        self.adapters.get(&ext).cloned().ok_or_else(|| {
            Error::UnsupportedFileType(if ext.is_empty() {
                path.display().to_string()
            } else {
                ext
            })
        })
    }

    /// Resolve and load in one step
    pub fn load(&self, path: &Path) -> Result<LoadedDocument> {
        let adapter = self.resolve(path)?;
        tracing::debug!(path = %path.display(), adapter = adapter.name(), "Loading document");
        adapter.load(path)
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.adapters.keys().cloned().collect();
        exts.sort();
        exts
    }
}

/// Plain text and markdown
pub struct TextAdapter {
    decoding: DecodingConfig,
}

impl TextAdapter {
    pub fn new(decoding: DecodingConfig) -> Self {
        Self { decoding }
    }
}

impl DocumentAdapter for TextAdapter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt", "md", "markdown"]
    }

    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        let bytes = read_file(path)?;
        let text = decode_text(path, &bytes, &self.decoding)?;
        Ok(LoadedDocument::Text(vec![TextSegment {
            text,
            metadata: base_metadata(path, "text"),
        }]))
    }
}

/// Comma (or otherwise) delimited files, one record per row
pub struct CsvAdapter {
    tabular: TabularConfig,
    decoding: DecodingConfig,
}

impl CsvAdapter {
    pub fn new(tabular: TabularConfig, decoding: DecodingConfig) -> Self {
        Self { tabular, decoding }
    }
}

impl DocumentAdapter for CsvAdapter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extensions(&self) -> &[&'static str] {
        &["csv"]
    }

    fn load(&self, path: &Path) -> Result<LoadedDocument> {
        if !self.tabular.delimiter.is_ascii() {
            return Err(Error::config(format!(
                "CSV delimiter must be an ASCII character, got '{}'",
                self.tabular.delimiter
            )));
        }

        let bytes = read_file(path)?;
        let text = decode_text(path, &bytes, &self.decoding)?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.tabular.delimiter as u8)
            .has_headers(self.tabular.has_headers)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = if self.tabular.has_headers {
            reader
                .headers()
                .map_err(|e| Error::adapter(path, e.to_string()))?
                .iter()
                .map(|h| h.trim().to_string())
                .collect()
        } else {
            Vec::new()
        };

        let base = base_metadata(path, "csv");
        let mut rows = Vec::new();

        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::adapter(path, e.to_string()))?;
            let fields = record
                .iter()
                .enumerate()
                .filter(|(_, value)| !is_null_value(value, &self.tabular.null_markers))
                .map(|(col, value)| {
                    let key = headers
                        .get(col)
                        .filter(|h| !h.is_empty())
                        .cloned()
                        .unwrap_or_else(|| format!("column_{}", col + 1));
                    (key, value.trim().to_string())
                })
                .collect();

            rows.push(TabularRow {
                number: i + 1,
                fields,
                metadata: base.clone(),
            });
        }

        Ok(LoadedDocument::Rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_registry_resolves_case_insensitively() {
        let registry = AdapterRegistry::with_defaults(&RagConfig::default());
        assert_eq!(registry.resolve(Path::new("NOTES.TXT")).unwrap().name(), "text");
        assert_eq!(registry.resolve(Path::new("data.csv")).unwrap().name(), "csv");
    }

    #[test]
    fn test_unknown_extension() {
        let registry = AdapterRegistry::with_defaults(&RagConfig::default());
        let err = registry.load(Path::new("archive.zip")).err().unwrap();
        assert!(matches!(err, Error::UnsupportedFileType(ext) if ext == "zip"));
    }

    #[test]
    fn test_text_adapter_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "notes.md", b"# Title\n\nBody text");
        let doc = TextAdapter::new(DecodingConfig::default()).load(&path).unwrap();

        let LoadedDocument::Text(segments) = doc else {
            panic!("expected text");
        };
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].metadata["source"], "notes.md");
        assert_eq!(segments[0].metadata["file_type"], "text");
    }

    #[test]
    fn test_missing_file_is_adapter_error() {
        let err = TextAdapter::new(DecodingConfig::default())
            .load(Path::new("/nonexistent/file.txt"))
            .unwrap_err();
        assert!(err.is_adapter_error());
    }

    #[test]
    fn test_csv_drops_null_fields() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "people.csv",
            b"name,age,city\nAda,36,London\nAlan,,NULL\nGrace,0,n/a\n",
        );
        let adapter = CsvAdapter::new(TabularConfig::default(), DecodingConfig::default());
        let LoadedDocument::Rows(rows) = adapter.load(&path).unwrap() else {
            panic!("expected rows");
        };

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].fields.len(), 3);
        assert_eq!(rows[1].fields, vec![("name".to_string(), "Alan".to_string())]);
        assert_eq!(rows[2].fields.len(), 2);
        assert_eq!(rows[2].number, 3);
        assert_eq!(rows[2].metadata["file_type"], "csv");
    }

    #[test]
    fn test_csv_without_headers() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "raw.csv", b"a;b\nc;d\n");
        let tabular = TabularConfig {
            delimiter: ';',
            has_headers: false,
            ..Default::default()
        };
        let adapter = CsvAdapter::new(tabular, DecodingConfig::default());
        let LoadedDocument::Rows(rows) = adapter.load(&path).unwrap() else {
            panic!("expected rows");
        };

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[1], ("column_2".to_string(), "b".to_string()));
    }
}
