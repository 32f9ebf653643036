//! In-memory vector index backend
//!
//! `FlatIndex` scores every stored vector. It is meant for document sets of
//! the size a single organisation keeps on disk, and it makes ordering fully
//! deterministic, which the retrieval tests rely on.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Error, Result};

use super::vector_index::{IndexBackend, IndexEntry, IndexHit, VectorIndex};

/// Exhaustive cosine-similarity index
pub struct FlatIndex {
    collection: String,
    dimensions: usize,
    entries: RwLock<Vec<IndexEntry>>,
}

impl FlatIndex {
    /// Create an empty index
    pub fn new(collection: impl Into<String>, dimensions: usize) -> Self {
        Self {
            collection: collection.into(),
            dimensions,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn insert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != self.dimensions) {
            return Err(Error::index_build(
                &self.collection,
                format!(
                    "vector for {} has {} dimensions, expected {}",
                    bad.chunk.filename,
                    bad.vector.len(),
                    self.dimensions
                ),
            ));
        }

        self.entries.write().extend(entries);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        departments: Option<&BTreeSet<String>>,
    ) -> Result<Vec<IndexHit>> {
        if vector.len() != self.dimensions {
            return Err(Error::retrieval(format!(
                "query vector has {} dimensions, '{}' expects {}",
                vector.len(),
                self.collection,
                self.dimensions
            )));
        }

        let entries = self.entries.read();
        let mut hits: Vec<IndexHit> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| departments.map_or(true, |d| d.contains(&e.chunk.department)))
            .map(|(ordinal, e)| IndexHit {
                chunk: Arc::clone(&e.chunk),
                score: relevance(vector, &e.vector),
                ordinal,
            })
            .filter(|hit| hit.score.is_finite())
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.ordinal.cmp(&b.ordinal)));
        hits.truncate(k);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        &self.collection
    }
}

/// Backend producing [`FlatIndex`] collections
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend;

impl MemoryBackend {
    /// Create a new backend
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IndexBackend for MemoryBackend {
    async fn create_index(&self, collection: &str, dimensions: usize) -> Result<Arc<dyn VectorIndex>> {
        Ok(Arc::new(FlatIndex::new(collection, dimensions)))
    }

    fn name(&self) -> &str {
        "memory-flat"
    }
}

/// Cosine similarity clamped to [0, 1]; zero vectors score 0
pub fn relevance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}
