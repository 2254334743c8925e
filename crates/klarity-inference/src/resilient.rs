//! Backend wrapper that never fails.

use async_trait::async_trait;
use tracing::warn;

use klarity_core::{AnalysisBackend, DocumentAnalysis, Result};

use crate::fallback::fallback_analysis;

/// Wraps an [`AnalysisBackend`] and substitutes [`fallback_analysis`] for any
/// error, so callers always receive a complete record.
pub struct ResilientAnalyzer<B> {
    inner: B,
}

impl<B: AnalysisBackend> ResilientAnalyzer<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Analyze with the wrapped backend, falling back on error.
    pub async fn analyze_or_fallback(&self, text: &str, document_type: &str) -> DocumentAnalysis {
        match self.inner.analyze(text, document_type).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "resilient",
                    model = %self.inner.model_name(),
                    error = %e,
                    "Analysis failed, using fallback"
                );
                fallback_analysis(text)
            }
        }
    }
}

#[async_trait]
impl<B: AnalysisBackend> AnalysisBackend for ResilientAnalyzer<B> {
    async fn analyze(&self, text: &str, document_type: &str) -> Result<DocumentAnalysis> {
        Ok(self.analyze_or_fallback(text, document_type).await)
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAnalysisBackend;

    #[tokio::test]
    async fn test_passes_through_success() {
        let analyzer = ResilientAnalyzer::new(MockAnalysisBackend::new().with_summary("model"));
        let analysis = analyzer.analyze("a. b. c. d.", "nda").await.unwrap();
        assert_eq!(analysis.summary, "model");
    }

    #[tokio::test]
    async fn test_substitutes_fallback_on_error() {
        let analyzer = ResilientAnalyzer::new(MockAnalysisBackend::new().with_failure());
        let analysis = analyzer
            .analyze("First. Second. Third. Fourth.", "nda")
            .await
            .unwrap();
        assert_eq!(analysis.summary, "First. Second. Third.");
        assert_eq!(analysis.jurisdiction, "Not analyzed");
        assert_eq!(analyzer.inner().call_count(), 1);
    }
}
