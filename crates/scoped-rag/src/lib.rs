//! scoped-rag: role-scoped retrieval-augmented question answering
//!
//! Documents are ingested from a tree whose first-level directories are
//! departments. Each department gets its own vector index and a global index
//! spans all of them. A requester's role decides which index is searched and,
//! for the global index, which departments are visible, so every citation a
//! role receives comes from a department that role may read.

pub mod access;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use access::{AccessPolicy, AccessRouter, Route};
pub use config::RagConfig;
pub use engine::{EngineState, QueryEngine, RefreshSummary};
pub use error::{Error, Result};
pub use index::{IndexPartitionManager, IndexRegistry};
pub use types::{
    document::{Chunk, ContentType, Document, FileType},
    query::Query,
    response::{Citation, QueryOutcome, QueryResponse, RetrievalResult},
};
