//! Thresholded similarity search over routed stores

pub mod search;

pub use search::RetrievalEngine;
