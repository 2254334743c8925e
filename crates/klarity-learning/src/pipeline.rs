//! End-to-end document analysis: screen, tag, analyze, enrich.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use klarity_classify::{detect_document_type, AgreementClassifier};
use klarity_core::{ClassificationResult, EnrichedAnalysis, Result};

use crate::coordinator::CoordinatorHandle;

/// Message attached to every rejection.
pub const REJECTION_MESSAGE: &str = "Rejected: Not a valid agreement.";

/// Result of running a document through the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The classifier did not accept the document; no analysis was requested.
    Rejected {
        classification: ClassificationResult,
        message: String,
    },
    Analyzed {
        classification: ClassificationResult,
        document_type: String,
        analysis: EnrichedAnalysis,
        timestamp: DateTime<Utc>,
    },
}

impl PipelineOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, PipelineOutcome::Rejected { .. })
    }

    pub fn classification(&self) -> &ClassificationResult {
        match self {
            PipelineOutcome::Rejected { classification, .. }
            | PipelineOutcome::Analyzed { classification, .. } => classification,
        }
    }
}

/// Classifier in front of a running learning coordinator.
pub struct AnalysisPipeline {
    classifier: AgreementClassifier,
    coordinator: CoordinatorHandle,
}

impl AnalysisPipeline {
    pub fn new(coordinator: CoordinatorHandle) -> Self {
        Self {
            classifier: AgreementClassifier::default(),
            coordinator,
        }
    }

    pub fn with_classifier(mut self, classifier: AgreementClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Classify `text` and, if it is an agreement, analyze it with learning.
    ///
    /// Rejections return without calling the analysis backend.
    #[instrument(skip(self, text), fields(subsystem = "pipeline", component = "analysis", op = "analyze_document", text_len = text.len()))]
    pub async fn analyze_document(&self, text: &str) -> Result<PipelineOutcome> {
        let classification = self.classifier.classify(text);
        if !classification.accepted {
            info!(
                reason = ?classification.reason,
                vote_ratio = classification.vote_ratio,
                heuristic = classification.heuristic,
                "Document rejected"
            );
            return Ok(PipelineOutcome::Rejected {
                classification,
                message: REJECTION_MESSAGE.to_string(),
            });
        }

        let document_type = detect_document_type(text);
        let analysis = self
            .coordinator
            .analyze_with_learning(text, Some(document_type))
            .await?;
        info!(
            document_type,
            quality_score = analysis.learning_insights.quality_score,
            "Document analyzed"
        );

        Ok(PipelineOutcome::Analyzed {
            classification,
            document_type: document_type.to_string(),
            analysis,
            timestamp: Utc::now(),
        })
    }
}
