//! Core types for the role-scoped RAG engine

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ContentType, Document, FileCategory, FileType};
pub use query::Query;
pub use response::{Citation, QueryOutcome, QueryResponse, RetrievalResult, ScoredChunk};
