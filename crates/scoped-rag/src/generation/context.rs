//! Context assembly and citation building
//!
//! Both are derived from the same [`RetrievalResult`], in the same order, so
//! citation `i` always describes the `i`-th block of the context.

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Citation, RetrievalResult};

/// Placeholder for missing chunk metadata
const UNKNOWN: &str = "unknown";

/// Prompt context plus the citations that back it
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    /// Chunk texts joined by newlines, in result order
    pub context: String,
    /// One citation per chunk, in result order
    pub citations: Vec<Citation>,
}

/// Stateless context assembler
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    preview_chars: usize,
}

impl ContextAssembler {
    /// Create an assembler producing previews of `preview_chars` characters
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars }
    }

    /// Merge retrieved chunks into a context string and citations
    pub fn assemble(&self, result: &RetrievalResult) -> AssembledContext {
        let context = result
            .iter()
            .map(|entry| entry.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let citations = result
            .iter()
            .map(|entry| Citation {
                filename: or_unknown(&entry.chunk.filename),
                department: or_unknown(&entry.chunk.department),
                summary: truncate_snippet(&entry.chunk.text, self.preview_chars),
                relevance_score: entry.score,
            })
            .collect();

        AssembledContext { context, citations }
    }
}

fn or_unknown(value: &str) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

/// Leading `max_chars` characters, cut at a word boundary when possible
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max_chars {
        return text.to_string();
    }

    let head = graphemes[..max_chars].concat();
    let cut = match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => head[..pos].trim_end(),
        _ => head.as_str(),
    };
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ContentType, ScoredChunk};
    use std::sync::Arc;

    fn scored(department: &str, filename: &str, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Arc::new(Chunk {
                department: department.to_string(),
                filename: filename.to_string(),
                file_path: String::new(),
                file_type: ".md".to_string(),
                content_type: ContentType::Text,
                text: text.to_string(),
                row_start: None,
                row_end: None,
            }),
            score,
        }
    }

    #[test]
    fn test_context_and_citations_follow_result_order() {
        let result = RetrievalResult::from_ordered(vec![
            scored("marketing", "campaign.md", "Spring campaign budget", 0.9),
            scored("finance", "q3.md", "Q3 revenue", 0.5),
        ]);
        let assembled = ContextAssembler::new(200).assemble(&result);

        assert_eq!(assembled.context, "Spring campaign budget\nQ3 revenue");
        assert_eq!(assembled.citations.len(), 2);
        assert_eq!(assembled.citations[0].filename, "campaign.md");
        assert_eq!(assembled.citations[1].department, "finance");
        assert!((assembled.citations[0].relevance_score - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_metadata_uses_placeholders() {
        let result = RetrievalResult::from_ordered(vec![scored("", " ", "orphan text", 0.4)]);
        let citation = &ContextAssembler::new(200).assemble(&result).citations[0];
        assert_eq!(citation.filename, "unknown");
        assert_eq!(citation.department, "unknown");
    }

    #[test]
    fn test_empty_result() {
        let assembled = ContextAssembler::new(200).assemble(&RetrievalResult::empty());
        assert!(assembled.context.is_empty());
        assert!(assembled.citations.is_empty());
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("short", 200), "short");
        assert_eq!(truncate_snippet("alpha beta gamma", 12), "alpha beta...");
        assert_eq!(truncate_snippet("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_snippet("ééééé", 3), "ééé...");
    }
}
