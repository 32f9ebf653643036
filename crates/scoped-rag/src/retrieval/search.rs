//! Similarity search with thresholding
//!
//! Every failure on this path (no store, empty store, embedding or backend
//! error) degrades to an empty [`RetrievalResult`].

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::access::Route;
use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::index::ChunkStore;
use crate::providers::EmbeddingProvider;
use crate::types::{RetrievalResult, ScoredChunk};

/// Stateless retrieval over a routed store
#[derive(Clone)]
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    score_threshold: f32,
}

impl RetrievalEngine {
    /// Create an engine with explicit parameters
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize, score_threshold: f32) -> Self {
        Self {
            embedder,
            top_k,
            score_threshold,
        }
    }

    /// Create an engine from `[retrieval]` settings
    pub fn from_config(embedder: Arc<dyn EmbeddingProvider>, config: &RetrievalConfig) -> Self {
        Self::new(embedder, config.top_k, config.score_threshold)
    }

    /// Search the store a route points at
    pub async fn search(&self, text: &str, route: &Route) -> RetrievalResult {
        match route.store() {
            Some(store) => {
                self.search_with(text, store, route.filter(), self.top_k, self.score_threshold)
                    .await
            }
            None => RetrievalResult::empty(),
        }
    }

    /// Search with explicit `k` and threshold
    pub async fn search_with(
        &self,
        text: &str,
        store: &ChunkStore,
        filter: Option<&BTreeSet<String>>,
        k: usize,
        threshold: f32,
    ) -> RetrievalResult {
        if k == 0 || store.chunk_count() == 0 {
            return RetrievalResult::empty();
        }

        match self.try_search(text, store, filter, k, threshold).await {
            Ok(result) => {
                tracing::debug!(
                    "{} matches >= {:.2} in {}",
                    result.len(),
                    threshold,
                    store.collection()
                );
                result
            }
            Err(e) => {
                tracing::error!("Search in {} failed: {}", store.collection(), e);
                RetrievalResult::empty()
            }
        }
    }

    async fn try_search(
        &self,
        text: &str,
        store: &ChunkStore,
        filter: Option<&BTreeSet<String>>,
        k: usize,
        threshold: f32,
    ) -> Result<RetrievalResult> {
        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| Error::retrieval(format!("query embedding failed: {}", e)))?;

        let hits = store.index().query(&vector, k, filter).await?;

        let entries = hits
            .into_iter()
            .filter(|hit| hit.score >= threshold)
            .map(|hit| ScoredChunk {
                chunk: hit.chunk,
                score: hit.score,
            })
            .collect();

        Ok(RetrievalResult::from_ordered(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::GLOBAL_COLLECTION;
    use crate::providers::{FlatIndex, HashingEmbedder, IndexEntry, VectorIndex};
    use crate::types::{Chunk, ContentType};
    use async_trait::async_trait;

    fn chunk(department: &str, text: &str) -> Arc<Chunk> {
        Arc::new(Chunk {
            department: department.to_string(),
            filename: format!("{}.md", department),
            file_path: String::new(),
            file_type: ".md".to_string(),
            content_type: ContentType::Text,
            text: text.to_string(),
            row_start: None,
            row_end: None,
        })
    }

    async fn store(embedder: &HashingEmbedder, chunks: Vec<Arc<Chunk>>) -> ChunkStore {
        let index = Arc::new(FlatIndex::new(GLOBAL_COLLECTION, embedder.dimensions()));
        let departments = chunks.iter().map(|c| c.department.clone()).collect();
        let count = chunks.len();
        let entries = chunks
            .into_iter()
            .map(|chunk| IndexEntry {
                vector: embedder.embed_text(&chunk.text),
                chunk,
            })
            .collect();
        index.insert(entries).await.unwrap();
        ChunkStore::new(GLOBAL_COLLECTION, index, count, departments)
    }

    fn engine(embedder: HashingEmbedder) -> RetrievalEngine {
        RetrievalEngine::new(Arc::new(embedder), 5, 0.3)
    }

    #[tokio::test]
    async fn test_threshold_filters_unrelated_chunks() {
        let embedder = HashingEmbedder::new(512).unwrap();
        let store = store(
            &embedder,
            vec![
                chunk("marketing", "spring campaign budget"),
                chunk("finance", "quarterly revenue growth"),
            ],
        )
        .await;

        let result = engine(embedder)
            .search_with("campaign budget", &store, None, 5, 0.3)
            .await;
        assert_eq!(result.len(), 1);
        assert_eq!(result.entries()[0].chunk.department, "marketing");
    }

    #[tokio::test]
    async fn test_threshold_monotonicity() {
        let embedder = HashingEmbedder::new(512).unwrap();
        let store = store(
            &embedder,
            vec![
                chunk("hr", "leave policy annual leave"),
                chunk("hr", "leave request form"),
                chunk("hr", "parking policy"),
                chunk("hr", "holiday calendar"),
            ],
        )
        .await;
        let engine = engine(embedder);

        let mut previous: Option<Vec<String>> = None;
        for threshold in [0.0f32, 0.1, 0.3, 0.5, 0.7, 0.9, 1.0] {
            let result = engine.search_with("leave policy", &store, None, 10, threshold).await;
            assert!(result.iter().all(|e| e.score >= threshold));
            let texts: Vec<String> = result.iter().map(|e| e.chunk.text.clone()).collect();
            if let Some(prev) = &previous {
                assert!(texts.iter().all(|t| prev.contains(t)), "threshold {}", threshold);
            }
            previous = Some(texts);
        }
    }

    #[tokio::test]
    async fn test_k_limits_and_order() {
        let embedder = HashingEmbedder::new(512).unwrap();
        let store = store(
            &embedder,
            vec![
                chunk("hr", "payroll"),
                chunk("hr", "payroll schedule"),
                chunk("hr", "payroll"),
            ],
        )
        .await;

        let result = engine(embedder).search_with("payroll", &store, None, 2, 0.0).await;
        assert_eq!(result.len(), 2);
        let scores: Vec<f32> = result.iter().map(|e| e.score).collect();
        assert!(scores[0] >= scores[1]);
        assert_eq!(result.entries()[0].chunk.text, "payroll");
        assert_eq!(result.entries()[1].chunk.text, "payroll");
    }

    #[tokio::test]
    async fn test_filter_restricts_departments() {
        let embedder = HashingEmbedder::new(512).unwrap();
        let store = store(
            &embedder,
            vec![chunk("finance", "budget review"), chunk("marketing", "budget review")],
        )
        .await;

        let allowed = BTreeSet::from(["finance".to_string()]);
        let result = engine(embedder)
            .search_with("budget", &store, Some(&allowed), 5, 0.0)
            .await;
        assert_eq!(result.len(), 1);
        assert_eq!(result.entries()[0].chunk.department, "finance");
    }

    #[tokio::test]
    async fn test_no_store_and_empty_store() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let empty = store(&embedder, Vec::new()).await;
        let engine = engine(embedder);

        assert!(engine.search("anything", &Route::NoStore).await.is_empty());
        assert!(engine.search_with("anything", &empty, None, 5, 0.0).await.is_empty());
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::embedding("model offline"))
        }

        fn dimensions(&self) -> usize {
            64
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_empty() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let store = store(&embedder, vec![chunk("hr", "leave policy")]).await;

        let engine = RetrievalEngine::new(Arc::new(BrokenEmbedder), 5, 0.0);
        assert!(engine.search_with("leave", &store, None, 5, 0.0).await.is_empty());
    }
}
