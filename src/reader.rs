//! Text extraction from document sources.

use crate::error::{HowieError, Result};
use std::path::Path;
use tracing::debug;

/// Reads the plain text out of a document.
pub trait DocumentReader: Send + Sync {
    fn read_text(&self, path: &Path) -> Result<String>;
}

/// Extracts text from PDF files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReader;

impl DocumentReader for PdfReader {
    fn read_text(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: file not found", path.display()),
            )
            .into());
        }
        let text = pdf_extract::extract_text(path)
            .map_err(|e| HowieError::Pdf(format!("{}: {}", path.display(), e)))?;
        debug!("Extracted {} characters from {}", text.len(), path.display());
        Ok(text)
    }
}

/// Reads UTF-8 text files as-is. Lets a text or markdown manual stand in for the PDF.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn read_text(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
        })?)
    }
}

/// Pick a reader by file extension. Anything that is not a PDF is read as text.
pub fn reader_for(path: &Path) -> Box<dyn DocumentReader> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Box::new(PdfReader)
    } else {
        Box::new(PlainTextReader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.txt");
        std::fs::write(&path, "Fill the reservoir.\nPress start.").unwrap();

        let text = reader_for(&path).read_text(&path).unwrap();
        assert_eq!(text, "Fill the reservoir.\nPress start.");
    }

    #[test]
    fn test_missing_pdf_is_io_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.PDF");
        match reader_for(&path).read_text(&path).unwrap_err() {
            HowieError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_pdf_is_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        let err = PdfReader.read_text(&path).unwrap_err();
        assert!(matches!(err, HowieError::Pdf(_)));
    }
}
