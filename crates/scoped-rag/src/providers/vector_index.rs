//! Vector index traits for storing and searching chunk embeddings

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::types::Chunk;

/// A chunk with its embedding, ready for insertion
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// The chunk; its `department` is the filter tag
    pub chunk: Arc<Chunk>,
    /// Embedding vector
    pub vector: Vec<f32>,
}

/// Search hit from a vector index
#[derive(Debug, Clone)]
pub struct IndexHit {
    /// The matched chunk
    pub chunk: Arc<Chunk>,
    /// Relevance score (0.0 to 1.0, 1.0 = identical)
    pub score: f32,
    /// Position of the entry in insertion order
    pub ordinal: usize,
}

/// Trait for a single searchable collection
///
/// Hits must be ordered by score descending, ties by ascending `ordinal`.
///
/// Implementations:
/// - `FlatIndex`: in-memory exhaustive cosine scan
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Append entries; ordinals continue from the current length
    async fn insert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Nearest neighbours of `vector`, restricted to `departments` when given
    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        departments: Option<&BTreeSet<String>>,
    ) -> Result<Vec<IndexHit>>;

    /// Number of stored entries
    async fn len(&self) -> Result<usize>;

    /// Check if the index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Collection name for logging
    fn name(&self) -> &str;
}

/// Factory for collections
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// Create a new, empty collection
    async fn create_index(&self, collection: &str, dimensions: usize) -> Result<Arc<dyn VectorIndex>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
