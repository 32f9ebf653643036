//! Department-partitioned ingestion pipeline

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::IngestionConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document, FileCategory};

use super::chunker::{TabularChunker, TextChunker};
use super::loader::{FileLoader, LoadedContent};

/// Chunks grouped by department, in deterministic order
pub type DepartmentChunks = BTreeMap<String, Vec<Chunk>>;

/// A file that could not be ingested
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    /// File path
    pub path: String,
    /// Error message
    pub error: String,
}

/// Summary of one ingestion pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Files that produced chunks (possibly zero for empty files)
    pub files_loaded: usize,
    /// Paths skipped because their type is unsupported
    pub files_unsupported: Vec<String>,
    /// Files that failed to load
    pub failures: Vec<IngestFailure>,
    /// Chunk counts per department
    pub chunks_per_department: BTreeMap<String, usize>,
}

impl IngestReport {
    /// Total number of chunks produced
    pub fn total_chunks(&self) -> usize {
        self.chunks_per_department.values().sum()
    }
}

/// Walks a department tree, loads each file and chunks it
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    text_chunker: TextChunker,
    tabular_chunker: TabularChunker,
}

impl IngestPipeline {
    /// Create a pipeline from ingestion settings
    pub fn new(config: &IngestionConfig) -> Result<Self> {
        Ok(Self {
            text_chunker: TextChunker::new(config.chunk_size, config.chunk_overlap)?,
            tabular_chunker: TabularChunker::new(config.tabular_target_chunks),
        })
    }

    /// Ingest every department under `root`.
    ///
    /// Only a missing or unreadable root is an error; individual files that fail
    /// are logged, recorded in the report and skipped.
    pub fn run(&self, root: &Path) -> Result<(DepartmentChunks, IngestReport)> {
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "data directory '{}' does not exist or is not a directory",
                root.display()
            )));
        }

        let mut departments = DepartmentChunks::new();
        let mut report = IngestReport::default();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_dir() {
                tracing::debug!("Ignoring {} outside any department", entry.path().display());
                continue;
            }

            let department = entry.file_name().to_string_lossy().into_owned();
            tracing::info!("Loading documents for {}", department);

            let chunks = self.load_department(entry.path(), &department, &mut report);
            if chunks.is_empty() {
                tracing::warn!("Department {} produced no chunks", department);
                continue;
            }

            tracing::info!("Loaded {} chunks for {}", chunks.len(), department);
            report.chunks_per_department.insert(department.clone(), chunks.len());
            departments.insert(department, chunks);
        }

        Ok((departments, report))
    }

    /// Load all files of one department directory, recursively
    fn load_department(
        &self,
        dir: &Path,
        department: &str,
        report: &mut IngestReport,
    ) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    tracing::error!("Error walking {}: {}", path, e);
                    report.failures.push(IngestFailure { path, error: e.to_string() });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let doc = Document::new(entry.into_path(), department);
            let path = doc.path.display().to_string();

            if doc.file_type.category() == FileCategory::Unsupported {
                tracing::warn!("Unsupported file type: {} ({})", doc.file_type, path);
                report.files_unsupported.push(path);
                continue;
            }

            match self.load_document(&doc) {
                Ok(doc_chunks) => {
                    tracing::info!("Loaded {}: {} chunks", doc.filename(), doc_chunks.len());
                    report.files_loaded += 1;
                    chunks.extend(doc_chunks);
                }
                Err(e) => {
                    tracing::error!("Error loading file {}: {}", path, e);
                    report.failures.push(IngestFailure { path, error: e.to_string() });
                }
            }
        }

        chunks
    }

    /// Load and chunk a single document
    pub fn load_document(&self, doc: &Document) -> Result<Vec<Chunk>> {
        let data = std::fs::read(&doc.path)
            .map_err(|e| Error::file_parse(doc.path.display().to_string(), e.to_string()))?;
        let path = doc.path.display().to_string();

        match FileLoader::load(&doc.file_type, &path, &data)? {
            LoadedContent::Text(text) => Ok(self.text_chunker.chunk_document(doc, &text)),
            LoadedContent::Table(table) => Ok(self.tabular_chunker.chunk_table(doc, &table)),
        }
    }

    /// Run on the blocking pool so parsing does not stall the runtime
    pub async fn run_blocking(&self, root: PathBuf) -> Result<(DepartmentChunks, IngestReport)> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.run(&root))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
