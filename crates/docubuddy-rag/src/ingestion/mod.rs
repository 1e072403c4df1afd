//! Document ingestion: format adapters, decoding and chunking

pub mod adapters;
pub mod chunker;
pub mod decode;
#[cfg(feature = "docx")]
pub mod docx;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod tabular;

pub use adapters::{
    AdapterRegistry, CsvAdapter, DocumentAdapter, LoadedDocument, TabularRow, TextAdapter,
    TextSegment,
};
pub use chunker::{normalize_whitespace, TextChunker};
#[cfg(feature = "docx")]
pub use docx::DocxAdapter;
#[cfg(feature = "pdf")]
pub use pdf::PdfAdapter;
