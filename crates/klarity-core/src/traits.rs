//! Core traits for klarity abstractions.
//!
//! These traits define the collaborator seams: where text comes from, who
//! writes the analysis, and where feedback is kept. Concrete implementations
//! live in the inference, db and cli crates.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// EXTRACTION
// =============================================================================

/// Turns an uploaded file into plain text.
///
/// Extraction is best effort: callers treat an error the same as empty text,
/// which the agreement classifier rejects with `empty_text`.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Whether this extractor understands the given file.
    fn supports(&self, filename: &str, mime_type: &str) -> bool;

    /// Extract text from raw file data.
    async fn extract(&self, data: &[u8], filename: &str, mime_type: &str) -> Result<String>;

    /// Human-readable name of this extractor.
    fn name(&self) -> &str;
}

// =============================================================================
// ANALYSIS
// =============================================================================

/// Produces the 12-category structured analysis of a document.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Analyze `text`, using `document_type` as a hint for the model.
    async fn analyze(&self, text: &str, document_type: &str) -> Result<DocumentAnalysis>;

    /// Name of the model or strategy behind this backend.
    fn model_name(&self) -> &str;
}

// =============================================================================
// FEEDBACK
// =============================================================================

/// Durable, append-ordered store of user feedback.
///
/// Mutating methods take `&mut self`: a store has exactly one writer.
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Validate and append a feedback entry. Returns the assigned id.
    async fn submit(
        &mut self,
        document_id: &str,
        original_document: &str,
        analysis_result: JsonValue,
        feedback: &JsonValue,
    ) -> Result<u64>;

    /// Entries not yet folded into the learner, in insertion order.
    fn unprocessed(&self) -> Vec<FeedbackEntry>;

    /// Flag an entry as processed. Returns `false` if the id is unknown.
    async fn mark_processed(&mut self, id: u64) -> Result<bool>;

    /// Look up an entry by id.
    fn get(&self, id: u64) -> Option<&FeedbackEntry>;

    /// Aggregate ratings and recent entries.
    fn summary(&self) -> FeedbackSummary;

    /// Full history as pretty-printed JSON.
    fn export_json(&self) -> Result<String>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
