//! Immutable snapshot of the stores produced by one build

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::providers::VectorIndex;

/// Collection holding every chunk, tagged by department
pub const GLOBAL_COLLECTION: &str = "global_company_data";

/// Collection name for a department store
pub fn collection_name(department: &str) -> String {
    format!("dept_{}", department.to_lowercase().replace('-', "_"))
}

/// A built vector index and what it contains
pub struct ChunkStore {
    collection: String,
    index: Arc<dyn VectorIndex>,
    chunk_count: usize,
    departments: BTreeSet<String>,
}

impl ChunkStore {
    /// Wrap a populated index
    pub fn new(
        collection: impl Into<String>,
        index: Arc<dyn VectorIndex>,
        chunk_count: usize,
        departments: BTreeSet<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            index,
            chunk_count,
            departments,
        }
    }

    /// Collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Underlying index
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Number of chunks inserted at build time
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Departments whose chunks the store holds
    pub fn departments(&self) -> &BTreeSet<String> {
        &self.departments
    }
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("collection", &self.collection)
            .field("backend", &self.index.name())
            .field("chunk_count", &self.chunk_count)
            .field("departments", &self.departments)
            .finish()
    }
}

/// All stores of one build generation
///
/// Never mutated after construction; a refresh publishes a new registry.
#[derive(Debug)]
pub struct IndexRegistry {
    departments: BTreeMap<String, Arc<ChunkStore>>,
    global: Option<Arc<ChunkStore>>,
    generation: u64,
    built_at: DateTime<Utc>,
}

/// Serializable overview of a registry
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    /// Build generation
    pub generation: u64,
    /// When the build finished
    pub built_at: DateTime<Utc>,
    /// Chunk count per department store
    pub department_chunks: BTreeMap<String, usize>,
    /// Chunk count of the global store, if built
    pub global_chunks: Option<usize>,
}

impl IndexRegistry {
    /// Assemble a registry from built stores
    pub fn new(
        departments: BTreeMap<String, Arc<ChunkStore>>,
        global: Option<Arc<ChunkStore>>,
        generation: u64,
    ) -> Self {
        Self {
            departments,
            global,
            generation,
            built_at: Utc::now(),
        }
    }

    /// Dedicated store of a department
    pub fn department(&self, department: &str) -> Option<&Arc<ChunkStore>> {
        self.departments.get(department)
    }

    /// Departments with a dedicated store
    pub fn department_names(&self) -> impl Iterator<Item = &str> {
        self.departments.keys().map(String::as_str)
    }

    /// Global store over all departments
    pub fn global(&self) -> Option<&Arc<ChunkStore>> {
        self.global.as_ref()
    }

    /// Build generation, increasing with every refresh
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the build finished
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Overview for logging and the HTTP surface
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            generation: self.generation,
            built_at: self.built_at,
            department_chunks: self
                .departments
                .iter()
                .map(|(name, store)| (name.clone(), store.chunk_count()))
                .collect(),
            global_chunks: self.global.as_ref().map(|g| g.chunk_count()),
        }
    }
}
