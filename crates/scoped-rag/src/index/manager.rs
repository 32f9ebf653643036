//! Index partition manager
//!
//! Owns every index. A build embeds each department's chunks once, creates one
//! store per department and a global store from the same vectors, and publishes
//! the result as a new [`IndexRegistry`] in a single swap. Only one build may
//! run at a time.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::ingestion::DepartmentChunks;
use crate::providers::{EmbeddingProvider, IndexBackend, IndexEntry};
use crate::types::Chunk;

use super::registry::{collection_name, ChunkStore, IndexRegistry, GLOBAL_COLLECTION};

/// Embedded chunks per department, in ingestion order
pub type EmbeddedDepartments = BTreeMap<String, Vec<IndexEntry>>;

/// Held for the duration of a build; releases the build lock on drop
pub struct BuildGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    building: &'a AtomicBool,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.building.store(false, Ordering::SeqCst);
    }
}

/// Builds and publishes index registries
pub struct IndexPartitionManager {
    backend: Arc<dyn IndexBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    current: RwLock<Option<Arc<IndexRegistry>>>,
    build_lock: Mutex<()>,
    building: AtomicBool,
    generation: AtomicU64,
}

impl IndexPartitionManager {
    /// Create a manager with no published registry
    pub fn new(
        backend: Arc<dyn IndexBackend>,
        embedder: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
    ) -> Self {
        Self {
            backend,
            embedder,
            batch_size: batch_size.max(1),
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
            building: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Currently published registry, if any build has completed
    pub fn current(&self) -> Option<Arc<IndexRegistry>> {
        self.current.read().clone()
    }

    /// Whether a build is running right now
    pub fn is_building(&self) -> bool {
        self.building.load(Ordering::SeqCst)
    }

    /// Take the build lock, failing fast if another build holds it
    pub fn begin_build(&self) -> Result<BuildGuard<'_>> {
        let lock = self.build_lock.try_lock().map_err(|_| Error::BuildInProgress)?;
        self.building.store(true, Ordering::SeqCst);
        Ok(BuildGuard {
            _lock: lock,
            building: &self.building,
        })
    }

    /// Build and publish a registry from ingested chunks
    pub async fn rebuild(&self, chunks: &DepartmentChunks) -> Result<Arc<IndexRegistry>> {
        let _guard = self.begin_build()?;
        let registry = self.build(chunks).await;
        Ok(self.publish(registry))
    }

    /// Build a registry without publishing it; the caller holds the build lock
    pub async fn build(&self, chunks: &DepartmentChunks) -> IndexRegistry {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            "Building index generation {} for {} departments",
            generation,
            chunks.len()
        );

        let embedded = self.embed_departments(chunks).await;
        let departments = self.build_department_stores(&embedded).await;
        let global = self.build_global_store(&embedded).await;

        IndexRegistry::new(departments, global, generation)
    }

    /// Replace the published registry; in-flight queries keep their snapshot
    pub fn publish(&self, registry: IndexRegistry) -> Arc<IndexRegistry> {
        let registry = Arc::new(registry);
        *self.current.write() = Some(Arc::clone(&registry));
        tracing::info!(
            "Published index generation {} built at {} ({} department stores, global: {})",
            registry.generation(),
            registry.built_at().to_rfc3339(),
            registry.department_names().count(),
            registry.global().is_some()
        );
        registry
    }

    /// Embed every department's chunks.
    ///
    /// A department whose embedding fails is logged and left out, so it gets
    /// neither a dedicated store nor entries in the global store.
    pub async fn embed_departments(&self, chunks: &DepartmentChunks) -> EmbeddedDepartments {
        let mut embedded = EmbeddedDepartments::new();

        for (department, dept_chunks) in chunks {
            match self.embed_chunks(dept_chunks).await {
                Ok(entries) => {
                    tracing::debug!("Embedded {} chunks for {}", entries.len(), department);
                    embedded.insert(department.clone(), entries);
                }
                Err(e) => {
                    let err = Error::index_build(collection_name(department), e.to_string());
                    tracing::error!("{}", err);
                }
            }
        }

        embedded
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<IndexEntry>> {
        let mut entries = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} vectors for {} texts",
                    self.embedder.name(),
                    vectors.len(),
                    batch.len()
                )));
            }

            entries.extend(batch.iter().zip(vectors).map(|(chunk, vector)| IndexEntry {
                chunk: Arc::new(chunk.clone()),
                vector,
            }));
        }

        Ok(entries)
    }

    /// One store per department. A failing department is logged and skipped.
    pub async fn build_department_stores(
        &self,
        embedded: &EmbeddedDepartments,
    ) -> BTreeMap<String, Arc<ChunkStore>> {
        let mut stores = BTreeMap::new();

        for (department, entries) in embedded {
            let collection = collection_name(department);
            let departments = BTreeSet::from([department.clone()]);

            match self.build_store(&collection, entries.clone(), departments).await {
                Ok(store) => {
                    tracing::info!(
                        "Built store {} with {} chunks",
                        collection,
                        store.chunk_count()
                    );
                    stores.insert(department.clone(), Arc::new(store));
                }
                Err(e) => tracing::error!("{}", e),
            }
        }

        stores
    }

    /// Single store spanning every embedded department, entries in department
    /// then ingestion order
    pub async fn build_global_store(&self, embedded: &EmbeddedDepartments) -> Option<Arc<ChunkStore>> {
        let entries: Vec<IndexEntry> = embedded.values().flatten().cloned().collect();
        if entries.is_empty() {
            tracing::warn!("No chunks available, global store not built");
            return None;
        }

        let departments = embedded.keys().cloned().collect();
        match self.build_store(GLOBAL_COLLECTION, entries, departments).await {
            Ok(store) => {
                tracing::info!(
                    "Built store {} with {} chunks",
                    GLOBAL_COLLECTION,
                    store.chunk_count()
                );
                Some(Arc::new(store))
            }
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        }
    }

    async fn build_store(
        &self,
        collection: &str,
        entries: Vec<IndexEntry>,
        departments: BTreeSet<String>,
    ) -> Result<ChunkStore> {
        let chunk_count = entries.len();
        let index = self
            .backend
            .create_index(collection, self.embedder.dimensions())
            .await
            .map_err(|e| Error::index_build(collection, e.to_string()))?;

        index
            .insert(entries)
            .await
            .map_err(|e| Error::index_build(collection, e.to_string()))?;

        Ok(ChunkStore::new(collection, index, chunk_count, departments))
    }
}
