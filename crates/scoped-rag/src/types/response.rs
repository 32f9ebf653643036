//! Retrieval and response types

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::document::Chunk;

/// Answer returned when no chunk meets the relevance threshold
pub const NO_MATCH_ANSWER: &str =
    "I couldn't find relevant information in the documents available to your role to answer this question.";

/// Answer returned when the generation oracle fails or times out
pub const DEGRADED_ANSWER: &str = "Sorry, I encountered an error while processing your request.";

/// A retrieved chunk with its relevance score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Arc<Chunk>,
    /// Relevance score (0.0-1.0, higher is better)
    pub score: f32,
}

/// Ordered search result: score descending, ties in insertion order,
/// every entry at or above the threshold it was produced with
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    entries: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap entries that are already ordered and thresholded
    pub(crate) fn from_ordered(entries: Vec<ScoredChunk>) -> Self {
        Self { entries }
    }

    /// Ordered entries
    pub fn entries(&self) -> &[ScoredChunk] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing qualified
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.entries.iter()
    }
}

impl IntoIterator for RetrievalResult {
    type Item = ScoredChunk;
    type IntoIter = std::vec::IntoIter<ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Citation from a source document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// Source filename
    pub filename: String,
    /// Department the chunk belongs to
    pub department: String,
    /// Leading characters of the chunk text
    pub summary: String,
    /// Relevance score (0.0-1.0)
    pub relevance_score: f32,
}

/// How a query ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The oracle produced an answer from retrieved context
    Answered,
    /// Nothing met the threshold, generation was skipped
    NoMatches,
    /// The oracle failed, canned answer returned
    Degraded,
}

/// Response from a role-scoped query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated or canned answer
    pub answer: String,
    /// Citations in retrieval order
    pub citations: Vec<Citation>,
    /// How the query ended
    pub outcome: QueryOutcome,
    /// Correlation id shared with the log lines of this query
    pub correlation_id: Uuid,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Create an answered response
    pub fn answered(
        answer: String,
        citations: Vec<Citation>,
        correlation_id: Uuid,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            answer,
            citations,
            outcome: QueryOutcome::Answered,
            correlation_id,
            processing_time_ms,
        }
    }

    /// Create the response used when no relevant information is found
    pub fn not_found(correlation_id: Uuid, processing_time_ms: u64) -> Self {
        Self {
            answer: NO_MATCH_ANSWER.to_string(),
            citations: Vec::new(),
            outcome: QueryOutcome::NoMatches,
            correlation_id,
            processing_time_ms,
        }
    }

    /// Create the response used when generation failed
    pub fn degraded(correlation_id: Uuid, processing_time_ms: u64) -> Self {
        Self {
            answer: DEGRADED_ANSWER.to_string(),
            citations: Vec::new(),
            outcome: QueryOutcome::Degraded,
            correlation_id,
            processing_time_ms,
        }
    }
}
