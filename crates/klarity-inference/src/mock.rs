//! Mock analysis backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use klarity_inference::mock::MockAnalysisBackend;
//!
//! let backend = MockAnalysisBackend::new().with_summary("A lease.");
//! let analysis = backend.analyze("text", "rental agreement").await?;
//! assert_eq!(backend.call_count(), 1);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use klarity_core::{AnalysisBackend, DocumentAnalysis, Error, Result};

/// A recorded call to the mock.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub text: String,
    pub document_type: String,
}

/// Mock backend returning a fixed analysis or a fixed error.
#[derive(Clone)]
pub struct MockAnalysisBackend {
    response: DocumentAnalysis,
    fail: bool,
    latency_ms: u64,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockAnalysisBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnalysisBackend {
    pub fn new() -> Self {
        Self {
            response: DocumentAnalysis {
                summary: "Mock analysis".to_string(),
                ..Default::default()
            },
            fail: false,
            latency_ms: 0,
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return this analysis from every call.
    pub fn with_analysis(mut self, analysis: DocumentAnalysis) -> Self {
        self.response = analysis;
        self
    }

    /// Shorthand for an analysis with only a summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.response.summary = summary.into();
        self
    }

    /// Fail every call with an inference error.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Set simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().map(|log| log.len()).unwrap_or_default()
    }
}

#[async_trait]
impl AnalysisBackend for MockAnalysisBackend {
    async fn analyze(&self, text: &str, document_type: &str) -> Result<DocumentAnalysis> {
        if let Ok(mut log) = self.call_log.lock() {
            log.push(MockCall {
                text: text.to_string(),
                document_type: document_type.to_string(),
            });
        }

        if self.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.latency_ms)).await;
        }

        if self.fail {
            return Err(Error::Inference("Simulated failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls() {
        let backend = MockAnalysisBackend::new();
        backend.analyze("lease text", "rental agreement").await.unwrap();
        let calls = backend.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].document_type, "rental agreement");
    }

    #[tokio::test]
    async fn test_clones_share_log() {
        let backend = MockAnalysisBackend::new();
        let clone = backend.clone();
        clone.analyze("x", "nda").await.unwrap();
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_mode() {
        let backend = MockAnalysisBackend::new().with_failure();
        assert!(backend.analyze("x", "nda").await.is_err());
    }
}
