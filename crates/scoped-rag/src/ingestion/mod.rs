//! Document ingestion: department discovery, multi-format loading, chunking

mod chunker;
mod loader;
mod pipeline;

pub use chunker::{TabularChunker, TextChunker};
pub use loader::{FileLoader, LoadedContent, Table};
pub use pipeline::{DepartmentChunks, IngestFailure, IngestPipeline, IngestReport};
