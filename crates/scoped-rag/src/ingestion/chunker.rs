//! Text and tabular chunking

use std::collections::BTreeSet;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};
use super::loader::Table;

/// Max example values listed per column in a tabular summary
const SUMMARY_EXAMPLES_PER_COLUMN: usize = 3;

/// Fixed-size character window chunker
///
/// Windows are counted in grapheme clusters. Consecutive windows share
/// `overlap` characters; whitespace-only windows are dropped.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Overlap between windows
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::Config(format!(
                "invalid text window: size {} overlap {}",
                chunk_size, overlap
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Split text into overlapping windows
    pub fn split(&self, text: &str) -> Vec<String> {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        let step = self.chunk_size - self.overlap;

        let mut windows = Vec::new();
        let mut start = 0usize;
        while start < graphemes.len() {
            let end = (start + self.chunk_size).min(graphemes.len());
            let window = graphemes[start..end].concat();
            let window = window.trim();
            if !window.is_empty() {
                windows.push(window.to_string());
            }
            if end == graphemes.len() {
                break;
            }
            start += step;
        }

        windows
    }

    /// Chunk a loaded document's text
    pub fn chunk_document(&self, doc: &Document, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .map(|window| Chunk::text(doc, window))
            .collect()
    }
}

/// Tabular chunker: one summary chunk, then contiguous row-range chunks
#[derive(Debug, Clone)]
pub struct TabularChunker {
    /// Desired number of data chunks per file
    target_chunks: usize,
}

impl TabularChunker {
    /// Create a new tabular chunker
    pub fn new(target_chunks: usize) -> Self {
        Self {
            target_chunks: target_chunks.max(1),
        }
    }

    /// Rows per data chunk for a table of `total_rows`
    pub fn rows_per_chunk(&self, total_rows: usize) -> usize {
        (total_rows / self.target_chunks).max(1)
    }

    /// Row ranges `[start, end)` covering every row exactly once
    pub fn row_ranges(&self, total_rows: usize) -> Vec<(usize, usize)> {
        let size = self.rows_per_chunk(total_rows);
        (0..total_rows)
            .step_by(size)
            .map(|start| (start, (start + size).min(total_rows)))
            .collect()
    }

    /// Chunk a parsed table
    pub fn chunk_table(&self, doc: &Document, table: &Table) -> Vec<Chunk> {
        let filename = doc.filename();
        let ranges = self.row_ranges(table.rows.len());

        let mut chunks = Vec::with_capacity(ranges.len() + 1);
        chunks.push(Chunk::summary(doc, Self::summary_text(&filename, table)));

        let header_line = table.headers.join(" | ");
        for (start, end) in ranges {
            let mut text = format!("Data Chunk (rows {}-{}) from {}:\n", start + 1, end, filename);
            text.push_str(&header_line);
            for row in &table.rows[start..end] {
                text.push('\n');
                text.push_str(&row.join(" | "));
            }
            chunks.push(Chunk::data(doc, text, start, end));
        }

        chunks
    }

    /// Row count, column names and a few example values per column
    fn summary_text(filename: &str, table: &Table) -> String {
        let mut text = format!(
            "Tabular Summary for {}:\nNumber of rows: {}\nColumns: {}\n",
            filename,
            table.rows.len(),
            table.headers.join(", ")
        );

        for (col, header) in table.headers.iter().enumerate() {
            let mut seen = BTreeSet::new();
            let mut examples = Vec::new();
            for value in table.rows.iter().filter_map(|row| row.get(col)) {
                let value = value.trim();
                if value.is_empty() || !seen.insert(value) {
                    continue;
                }
                examples.push(value);
                if examples.len() == SUMMARY_EXAMPLES_PER_COLUMN {
                    break;
                }
            }
            if !examples.is_empty() {
                text.push_str(&format!("{} example values: {}\n", header, examples.join(", ")));
            }
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentType;
    use std::path::PathBuf;

    fn doc(name: &str) -> Document {
        Document::new(PathBuf::from(format!("/data/finance/{}", name)), "finance")
    }

    fn table(rows: usize) -> Table {
        Table {
            headers: vec!["id".to_string(), "amount".to_string()],
            rows: (0..rows).map(|i| vec![i.to_string(), (i * 10).to_string()]).collect(),
        }
    }

    #[test]
    fn test_text_windows_overlap() {
        let chunker = TextChunker::new(300, 50).unwrap();
        let text = "x".repeat(700);
        let windows = chunker.split(&text);

        // starts at 0, 250, 500
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].len(), 300);
        assert_eq!(windows[1].len(), 300);
        assert_eq!(windows[2].len(), 200);
    }

    #[test]
    fn test_text_windows_short_and_empty() {
        let chunker = TextChunker::new(300, 50).unwrap();
        assert_eq!(chunker.split("short note"), vec!["short note".to_string()]);
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   \n\n  ").is_empty());
        assert!(TextChunker::new(50, 50).is_err());
    }

    #[test]
    fn test_text_windows_respect_multibyte() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let windows = chunker.split("ééééééé");
        assert_eq!(windows, vec!["éééé", "éééé"]);
    }

    #[test]
    fn test_text_chunk_metadata() {
        let chunker = TextChunker::new(10, 2).unwrap();
        let chunks = chunker.chunk_document(&doc("notes.txt"), "quarterly revenue grew");
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.content_type == ContentType::Text));
        assert!(chunks.iter().all(|c| c.department == "finance" && c.file_type == ".txt"));
    }

    #[test]
    fn test_tabular_coverage_120_rows() {
        let chunker = TabularChunker::new(40);
        let chunks = chunker.chunk_table(&doc("ledger.csv"), &table(120));

        assert_eq!(chunks.len(), 41);
        assert_eq!(chunks[0].content_type, ContentType::Summary);
        assert!(chunks[0].text.contains("Number of rows: 120"));
        assert!(chunks[0].text.contains("Columns: id, amount"));

        let data = &chunks[1..];
        assert_eq!(data.len(), 40);
        assert_eq!(data[0].row_start, Some(0));
        assert_eq!(data[0].row_end, Some(3));
        assert!(data[0].text.starts_with("Data Chunk (rows 1-3) from ledger.csv:"));
    }

    #[test]
    fn test_tabular_ranges_cover_every_row_once() {
        let chunker = TabularChunker::new(40);
        for n in [0usize, 1, 39, 40, 41, 79, 80, 121, 1000, 1013] {
            let ranges = chunker.row_ranges(n);
            let size = (n / 40).max(1);
            assert_eq!(ranges.len(), n.div_ceil(size), "n = {}", n);

            let mut next = 0;
            for (start, end) in &ranges {
                assert_eq!(*start, next);
                assert!(end > start);
                next = *end;
            }
            assert_eq!(next, n);
        }
    }

    #[test]
    fn test_tabular_summary_examples() {
        let table = Table {
            headers: vec!["team".to_string()],
            rows: vec![
                vec!["ops".to_string()],
                vec!["".to_string()],
                vec!["ops".to_string()],
                vec!["sales".to_string()],
                vec!["legal".to_string()],
                vec!["hr".to_string()],
            ],
        };
        let chunks = TabularChunker::new(40).chunk_table(&doc("teams.csv"), &table);
        assert!(chunks[0].text.contains("team example values: ops, sales, legal\n"));
        assert_eq!(chunks.len(), 1 + 6);
    }
}
