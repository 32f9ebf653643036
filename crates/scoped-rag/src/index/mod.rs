//! Per-department and global index partitions

pub mod manager;
pub mod registry;

pub use manager::{BuildGuard, EmbeddedDepartments, IndexPartitionManager};
pub use registry::{collection_name, ChunkStore, IndexRegistry, RegistryStats, GLOBAL_COLLECTION};
