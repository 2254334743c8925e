//! Fixed analysis used when no model is available or the model misbehaves.

use async_trait::async_trait;

use klarity_core::{defaults, AnalysisBackend, DocumentAnalysis, Result};

const SUMMARY_SENTENCES: usize = 3;

/// Build the fallback record for `text`.
///
/// The summary is the first three sentences when the text has more than
/// three, otherwise the first 500 characters.
pub fn fallback_analysis(text: &str) -> DocumentAnalysis {
    let sentences: Vec<&str> = text.split('.').collect();
    let summary = if sentences.len() > SUMMARY_SENTENCES {
        let head: Vec<&str> = sentences[..SUMMARY_SENTENCES]
            .iter()
            .map(|s| s.trim())
            .collect();
        format!("{}.", head.join(". "))
    } else {
        text.chars().take(defaults::FEEDBACK_SNIPPET_CHARS).collect()
    };

    DocumentAnalysis {
        summary,
        jurisdiction: "Not analyzed".to_string(),
        recommendations: vec!["Have a legal professional review this document".to_string()],
        next_steps: vec!["Review document with legal counsel".to_string()],
        ..Default::default()
    }
}

/// Backend that always returns [`fallback_analysis`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackAnalysis;

#[async_trait]
impl AnalysisBackend for FallbackAnalysis {
    async fn analyze(&self, text: &str, _document_type: &str) -> Result<DocumentAnalysis> {
        Ok(fallback_analysis(text))
    }

    fn model_name(&self) -> &str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_takes_three_sentences() {
        let analysis = fallback_analysis("One. Two. Three. Four. Five.");
        assert_eq!(analysis.summary, "One. Two. Three.");
    }

    #[test]
    fn test_short_text_summary_is_prefix() {
        let analysis = fallback_analysis("Only one sentence. And two.");
        assert_eq!(analysis.summary, "Only one sentence. And two.");

        let long = "x".repeat(900);
        assert_eq!(fallback_analysis(&long).summary.len(), 500);
    }

    #[test]
    fn test_fixed_fields() {
        let analysis = fallback_analysis("text");
        assert_eq!(analysis.jurisdiction, "Not analyzed");
        assert_eq!(
            analysis.recommendations,
            vec!["Have a legal professional review this document".to_string()]
        );
        assert_eq!(
            analysis.next_steps,
            vec!["Review document with legal counsel".to_string()]
        );
        assert!(analysis.key_terms.is_empty());
        assert!(analysis.risks.is_empty());
        assert!(analysis.parties.is_empty());
    }

    #[tokio::test]
    async fn test_backend_never_fails() {
        let backend = FallbackAnalysis;
        let analysis = backend.analyze("", "nda").await.unwrap();
        assert_eq!(analysis.summary, "");
        assert_eq!(backend.model_name(), "fallback");
    }
}
