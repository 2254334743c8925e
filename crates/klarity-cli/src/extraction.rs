//! Plain-text extraction for documents given on the command line.

use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use klarity_core::{Error, Result, TextExtractor};

/// Extractor for plain text files.
///
/// Reads bytes as UTF-8, replacing invalid sequences.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn supports(&self, filename: &str, mime_type: &str) -> bool {
        mime_type.starts_with("text/")
            || matches!(
                extension(filename).as_deref(),
                Some("txt" | "text" | "md")
            )
    }

    async fn extract(&self, data: &[u8], filename: &str, mime_type: &str) -> Result<String> {
        if !self.supports(filename, mime_type) {
            return Err(Error::InvalidInput(format!(
                "unsupported file type: {} ({})",
                filename, mime_type
            )));
        }
        Ok(String::from_utf8_lossy(data).into_owned())
    }

    fn name(&self) -> &str {
        "plain_text"
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// MIME type guessed from the file extension.
pub fn mime_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("txt" | "text") => "text/plain",
        Some("md") => "text/markdown",
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Extract text, treating any failure as an empty document.
pub async fn extract_or_empty(extractor: &dyn TextExtractor, data: &[u8], filename: &str) -> String {
    let mime_type = mime_type_for(filename);
    match extractor.extract(data, filename, mime_type).await {
        Ok(text) => text,
        Err(e) => {
            warn!(
                subsystem = "cli",
                component = "extraction",
                extractor = extractor.name(),
                filename,
                error = %e,
                "Text extraction failed, treating document as empty"
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_extraction() {
        let text = PlainTextExtractor
            .extract(b"Lease.\nLine two.", "lease.txt", "text/plain")
            .await
            .unwrap();
        assert_eq!(text, "Lease.\nLine two.");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let text = PlainTextExtractor
            .extract(&[0xFF, 0xFE, b'h', b'i'], "x.txt", "text/plain")
            .await
            .unwrap();
        assert!(text.contains("hi"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_unsupported_file_becomes_empty_text() {
        let text = extract_or_empty(&PlainTextExtractor, b"%PDF-1.7", "contract.pdf").await;
        assert_eq!(text, "");
    }

    #[test]
    fn test_supports_by_extension_or_mime() {
        assert!(PlainTextExtractor.supports("NOTES.TXT", "application/octet-stream"));
        assert!(PlainTextExtractor.supports("upload", "text/plain"));
        assert!(!PlainTextExtractor.supports("a.docx", mime_type_for("a.docx")));
        assert_eq!(PlainTextExtractor.name(), "plain_text");
    }
}
