//! Provider abstractions for embeddings, generation, and vector indexing
//!
//! The engine only talks to these traits, so the embedding model, the
//! generation service and the index implementation can be swapped without
//! touching ingestion, routing or retrieval.

pub mod embedding;
pub mod hashing;
pub mod memory;
pub mod ollama;
pub mod oracle;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use hashing::HashingEmbedder;
pub use memory::{FlatIndex, MemoryBackend};
pub use ollama::{OllamaEmbedder, OllamaOracle};
pub use oracle::GenerationOracle;
pub use vector_index::{IndexBackend, IndexEntry, IndexHit, VectorIndex};
