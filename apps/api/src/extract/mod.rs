//! Text Extractor — turns an uploaded document (PDF, DOCX, plain text) into
//! normalized single-line text.
//!
//! The normalized text is the unique input to both the embedding generator
//! and the structured-field extractor, so both downstream artifacts always
//! describe the same content.

use std::path::Path;

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("error parsing PDF: {0}")]
    Pdf(String),

    #[error("error parsing DOCX: {0}")]
    Docx(String),

    #[error("error reading text file: {0}")]
    Txt(String),
}

/// Supported document formats, dispatched by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Case-insensitive extension dispatch. `.doc` goes through the DOCX
    /// parser, matching what callers actually upload.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" | "doc" => Some(DocumentFormat::Docx),
            "txt" => Some(DocumentFormat::Txt),
            _ => None,
        }
    }
}

/// Extracts and normalizes the text of the document at `path`.
///
/// Fails with `UnsupportedFormat` for unrecognized extensions and with a
/// format-specific error wrapping the original cause for corrupt files.
/// No partial text is ever returned.
pub fn extract_file(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let format = DocumentFormat::from_extension(ext).ok_or_else(|| {
        ExtractError::UnsupportedFormat(format!(".{}", ext.to_ascii_lowercase()))
    })?;

    let raw = match format {
        DocumentFormat::Pdf => extract_pdf(path)?,
        DocumentFormat::Docx => extract_docx(path)?,
        DocumentFormat::Txt => extract_txt(path)?,
    };

    Ok(normalize_whitespace(&raw))
}

/// All pages, concatenated in page order.
fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// All non-empty paragraphs, joined with newlines in document order.
/// Empty paragraphs are skipped; the newlines collapse during normalization.
fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(p) = child {
            let mut text = String::new();
            for pc in &p.children {
                if let ParagraphChild::Run(run) = pc {
                    for rc in &run.children {
                        if let RunChild::Text(t) = rc {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            if !text.is_empty() {
                paragraphs.push(text);
            }
        }
    }

    Ok(paragraphs.join("\n"))
}

fn extract_txt(path: &Path) -> Result<String, ExtractError> {
    std::fs::read_to_string(path).map_err(|e| ExtractError::Txt(e.to_string()))
}

/// Collapses carriage returns, newlines, and runs of whitespace into single
/// spaces and strips leading/trailing whitespace. The result contains no raw
/// line breaks.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("create temp file");
        file.write_all(contents).expect("write temp file");
        file
    }

    #[test]
    fn test_normalize_collapses_newlines_and_runs() {
        let input = "Python\r\nDjango\n\n  Backend   Engineer\t";
        assert_eq!(normalize_whitespace(input), "Python Django Backend Engineer");
    }

    #[test]
    fn test_normalize_whitespace_only_is_empty() {
        assert_eq!(normalize_whitespace("  \r\n \n\t  "), "");
    }

    #[test]
    fn test_txt_extraction_trims_and_collapses() {
        let file = temp_file(".txt", b"  Python Django Backend Engineer \n");
        let text = extract_file(file.path()).unwrap();
        assert_eq!(text, "Python Django Backend Engineer");
    }

    #[test]
    fn test_txt_whitespace_only_yields_empty_string() {
        let file = temp_file(".txt", b" \n \r\n \t ");
        assert_eq!(extract_file(file.path()).unwrap(), "");
    }

    #[test]
    fn test_extension_dispatch_is_case_insensitive() {
        let file = temp_file(".TXT", b"hello");
        assert_eq!(extract_file(file.path()).unwrap(), "hello");
    }

    #[test]
    fn test_unsupported_extension_fails() {
        let file = temp_file(".csv", b"a,b,c");
        let err = extract_file(file.path()).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume");
        std::fs::write(&path, b"text").unwrap();
        let err = extract_file(&path).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_pdf_fails_with_parse_error() {
        let file = temp_file(".pdf", b"this is not a pdf");
        let err = extract_file(file.path()).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_docx_paragraphs_join_and_normalize() {
        use docx_rs::{Docx, Paragraph, Run};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.docx");
        let file = std::fs::File::create(&path).unwrap();
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Python  Django")))
            .add_paragraph(Paragraph::new()) // empty paragraphs are skipped
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Backend Engineer")))
            .build()
            .pack(file)
            .unwrap();

        let text = extract_file(&path).unwrap();
        assert_eq!(text, "Python Django Backend Engineer");
    }

    #[test]
    fn test_corrupt_docx_fails_with_parse_error() {
        let file = temp_file(".docx", b"this is not a zip archive");
        let err = extract_file(file.path()).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn test_format_dispatch_table() {
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("DOCX"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("doc"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("txt"), Some(DocumentFormat::Txt));
        assert_eq!(DocumentFormat::from_extension("rtf"), None);
    }
}
