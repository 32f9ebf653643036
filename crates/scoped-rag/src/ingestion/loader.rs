//! Multi-format file loaders
//!
//! Dispatch is a closed match over [`FileType`]: document types produce text,
//! tabular types produce a header plus rows, anything else is rejected with
//! [`Error::UnsupportedFileType`].

use calamine::Reader;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Header and rows of a tabular file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names
    pub headers: Vec<String>,
    /// Data rows, header excluded
    pub rows: Vec<Vec<String>>,
}

/// Output of a loader
#[derive(Debug, Clone)]
pub enum LoadedContent {
    /// Extracted document text
    Text(String),
    /// Parsed table
    Table(Table),
}

/// Multi-format file loader
pub struct FileLoader;

impl FileLoader {
    /// Load raw bytes according to the file type.
    /// `path` is only used in error messages.
    pub fn load(file_type: &FileType, path: &str, data: &[u8]) -> Result<LoadedContent> {
        match file_type {
            FileType::Pdf => Self::parse_pdf(path, data).map(LoadedContent::Text),
            FileType::Txt | FileType::Markdown => Ok(LoadedContent::Text(Self::parse_text(data))),
            FileType::Docx | FileType::Doc => Self::parse_docx(path, data).map(LoadedContent::Text),
            FileType::Html => Self::parse_html(path, data).map(LoadedContent::Text),
            FileType::Csv => Self::parse_csv(data).map(LoadedContent::Table),
            FileType::Xlsx => Self::parse_xlsx(path, data).map(LoadedContent::Table),
            FileType::Unsupported(ext) => Err(Error::UnsupportedFileType(ext.clone())),
        }
    }

    /// Parse PDF document
    fn parse_pdf(path: &str, data: &[u8]) -> Result<String> {
        let content = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(path, format!("pdf-extract failed: {}", e)))?;

        let content = content
            .replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return Err(Error::file_parse(path, "No text content could be extracted from PDF"));
        }

        Ok(content)
    }

    /// Parse plain text or markdown
    fn parse_text(data: &[u8]) -> String {
        String::from_utf8_lossy(data).into_owned()
    }

    /// Parse DOCX document, paragraph text only
    fn parse_docx(path: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(path, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// Parse HTML document, body text joined by spaces
    fn parse_html(path: &str, data: &[u8]) -> Result<String> {
        let html = String::from_utf8_lossy(data);
        let document = scraper::Html::parse_document(&html);
        let body_selector = scraper::Selector::parse("body")
            .map_err(|e| Error::file_parse(path, format!("selector error: {:?}", e)))?;

        let mut content = String::new();
        if let Some(body) = document.select(&body_selector).next() {
            for text in body.text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !content.is_empty() {
                        content.push(' ');
                    }
                    content.push_str(trimmed);
                }
            }
        }

        Ok(content)
    }

    /// Parse CSV file; the first record is the header
    fn parse_csv(data: &[u8]) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let row: Vec<String> = record?.iter().map(|v| v.to_string()).collect();
            if !is_blank_row(&row) {
                rows.push(row);
            }
        }

        Ok(Table { headers, rows })
    }

    /// Parse the first worksheet of an Excel workbook; its first row is the header
    fn parse_xlsx(path: &str, data: &[u8]) -> Result<Table> {
        let cursor = std::io::Cursor::new(data);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::file_parse(path, e.to_string()))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::file_parse(path, "Workbook has no worksheets"))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| Error::file_parse(path, e.to_string()))?;

        let mut rows = range.rows().map(|row| {
            row.iter()
                .map(|cell| match cell {
                    calamine::Data::Empty => String::new(),
                    calamine::Data::String(s) => s.clone(),
                    calamine::Data::Float(f) => f.to_string(),
                    calamine::Data::Int(i) => i.to_string(),
                    calamine::Data::Bool(b) => b.to_string(),
                    calamine::Data::DateTime(dt) => dt.to_string(),
                    _ => String::new(),
                })
                .collect::<Vec<String>>()
        });

        let headers = rows.next().unwrap_or_default();
        let rows = rows.filter(|row| !is_blank_row(row)).collect();

        Ok(Table { headers, rows })
    }
}

/// Rows whose cells are all empty carry no data in either tabular format
fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_header_and_rows() {
        let data = b"region,revenue\nnorth,10\nsouth,20\n";
        let loaded = FileLoader::load(&FileType::Csv, "sales.csv", data).unwrap();

        match loaded {
            LoadedContent::Table(table) => {
                assert_eq!(table.headers, vec!["region", "revenue"]);
                assert_eq!(table.rows.len(), 2);
                assert_eq!(table.rows[1], vec!["south", "20"]);
            }
            LoadedContent::Text(_) => panic!("csv must load as a table"),
        }
    }

    #[test]
    fn test_csv_blank_rows_are_dropped() {
        let data = b"region,revenue\nnorth,10\n,\n  ,\nsouth,20\n";
        match FileLoader::load(&FileType::Csv, "sales.csv", data).unwrap() {
            LoadedContent::Table(table) => {
                assert_eq!(table.rows.len(), 2);
                assert_eq!(table.rows[1], vec!["south", "20"]);
            }
            LoadedContent::Text(_) => panic!("csv must load as a table"),
        }
    }

    #[test]
    fn test_html_body_text() {
        let data = b"<html><head><title>x</title></head><body><h1>Leave</h1><p>Policy  text</p></body></html>";
        match FileLoader::load(&FileType::Html, "p.html", data).unwrap() {
            LoadedContent::Text(text) => assert_eq!(text, "Leave Policy  text"),
            LoadedContent::Table(_) => panic!("html must load as text"),
        }
    }

    #[test]
    fn test_unsupported_and_broken_inputs() {
        let err = FileLoader::load(&FileType::Unsupported("png".into()), "a.png", b"").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(ext) if ext == "png"));

        let err = FileLoader::load(&FileType::Docx, "broken.docx", b"not a zip").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
