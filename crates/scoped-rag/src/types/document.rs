//! Document and chunk types with the metadata used for access control and citations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Microsoft Word document (.docx)
    Docx,
    /// Legacy Word document (.doc), loaded with the docx reader
    Doc,
    /// HTML document
    Html,
    /// CSV file
    Csv,
    /// Excel spreadsheet (.xlsx)
    Xlsx,
    /// Anything else, with the lower-cased extension
    Unsupported(String),
}

/// How a file type is turned into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Loaded as text, then split into character windows
    Document,
    /// Loaded as rows, then split into a summary and row-range chunks
    Tabular,
    /// Skipped with a warning
    Unsupported,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "docx" => Self::Docx,
            "doc" => Self::Doc,
            "html" | "htm" => Self::Html,
            "csv" => Self::Csv,
            "xlsx" => Self::Xlsx,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Detect file type from a path
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }

    /// Chunking category for this type
    pub fn category(&self) -> FileCategory {
        match self {
            Self::Pdf | Self::Txt | Self::Markdown | Self::Docx | Self::Doc | Self::Html => {
                FileCategory::Document
            }
            Self::Csv | Self::Xlsx => FileCategory::Tabular,
            Self::Unsupported(_) => FileCategory::Unsupported,
        }
    }

    /// Extension label stored in chunk metadata, e.g. ".pdf"
    pub fn extension_label(&self) -> String {
        match self {
            Self::Pdf => ".pdf".to_string(),
            Self::Txt => ".txt".to_string(),
            Self::Markdown => ".md".to_string(),
            Self::Docx => ".docx".to_string(),
            Self::Doc => ".doc".to_string(),
            Self::Html => ".html".to_string(),
            Self::Csv => ".csv".to_string(),
            Self::Xlsx => ".xlsx".to_string(),
            Self::Unsupported(ext) if ext.is_empty() => String::new(),
            Self::Unsupported(ext) => format!(".{}", ext),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension_label())
    }
}

/// Kind of content a chunk carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Window of document text
    Text,
    /// Overview of a tabular file
    Summary,
    /// Contiguous row range of a tabular file
    DataChunk,
}

/// A source file discovered under a department directory
#[derive(Debug, Clone)]
pub struct Document {
    /// Full path on disk
    pub path: PathBuf,
    /// Department the file belongs to
    pub department: String,
    /// File type
    pub file_type: FileType,
}

impl Document {
    /// Create a document for a discovered file
    pub fn new(path: PathBuf, department: impl Into<String>) -> Self {
        let file_type = FileType::from_path(&path);
        Self {
            path,
            department: department.into(),
            file_type,
        }
    }

    /// File name without directories
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Minimal indexed unit. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Department partition key
    pub department: String,
    /// Source file name
    pub filename: String,
    /// Source file path
    pub file_path: String,
    /// Source file extension label
    pub file_type: String,
    /// What the text represents
    pub content_type: ContentType,
    /// Chunk text
    pub text: String,
    /// First row covered (0-based, inclusive), tabular data chunks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_start: Option<usize>,
    /// End of the row range (0-based, exclusive), tabular data chunks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_end: Option<usize>,
}

impl Chunk {
    /// Create a text window chunk
    pub fn text(doc: &Document, text: String) -> Self {
        Self::with_content_type(doc, ContentType::Text, text)
    }

    /// Create a tabular summary chunk
    pub fn summary(doc: &Document, text: String) -> Self {
        Self::with_content_type(doc, ContentType::Summary, text)
    }

    /// Create a tabular data chunk covering rows `[row_start, row_end)`
    pub fn data(doc: &Document, text: String, row_start: usize, row_end: usize) -> Self {
        let mut chunk = Self::with_content_type(doc, ContentType::DataChunk, text);
        chunk.row_start = Some(row_start);
        chunk.row_end = Some(row_end);
        chunk
    }

    fn with_content_type(doc: &Document, content_type: ContentType, text: String) -> Self {
        Self {
            department: doc.department.clone(),
            filename: doc.filename(),
            file_path: doc.path.to_string_lossy().into_owned(),
            file_type: doc.file_type.extension_label(),
            content_type,
            text,
            row_start: None,
            row_end: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_dispatch() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("md").category(), FileCategory::Document);
        assert_eq!(FileType::from_extension("csv").category(), FileCategory::Tabular);
        assert_eq!(
            FileType::from_path(Path::new("a/b/photo.png")),
            FileType::Unsupported("png".to_string())
        );
        assert_eq!(FileType::from_path(Path::new("Makefile")).category(), FileCategory::Unsupported);
    }

    #[test]
    fn test_chunk_metadata() {
        let doc = Document::new(PathBuf::from("/data/finance/q1.csv"), "finance");
        let chunk = Chunk::data(&doc, "rows".to_string(), 0, 3);

        assert_eq!(chunk.department, "finance");
        assert_eq!(chunk.filename, "q1.csv");
        assert_eq!(chunk.file_type, ".csv");
        assert_eq!(chunk.content_type, ContentType::DataChunk);
        assert_eq!((chunk.row_start, chunk.row_end), (Some(0), Some(3)));

        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["content_type"], "data_chunk");
    }
}
