//! Core data models for klarity.
//!
//! These types are shared across all klarity crates and represent the core
//! domain entities: classification outcomes, analysis records, feedback
//! entries and quality predictions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// =============================================================================
// CLASSIFICATION TYPES
// =============================================================================

/// Why a document was rejected by the agreement classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The extracted text was empty or whitespace only.
    EmptyText,
    /// Neither the chunk vote nor the whole-text heuristic reached threshold.
    LowConfidence,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::EmptyText => write!(f, "empty_text"),
            RejectReason::LowConfidence => write!(f, "low_confidence"),
        }
    }
}

/// Outcome of agreement classification.
///
/// Ratios are reported rounded to three decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub accepted: bool,
    /// Number of chunks scored (at most 10).
    pub chunks: usize,
    /// Number of chunks whose cue score reached the vote threshold.
    pub votes: usize,
    pub vote_ratio: f64,
    /// Cue score of the whole text.
    pub heuristic: f64,
    pub avg_chunk_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl ClassificationResult {
    /// Rejection of an empty document; every measurement is zero.
    pub fn empty_text() -> Self {
        Self {
            accepted: false,
            chunks: 0,
            votes: 0,
            vote_ratio: 0.0,
            heuristic: 0.0,
            avg_chunk_score: 0.0,
            reason: Some(RejectReason::EmptyText),
        }
    }
}

// =============================================================================
// ANALYSIS TYPES
// =============================================================================

/// A defined term found in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyTerm {
    pub term: String,
    pub definition: String,
}

/// A main clause of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clause {
    pub name: String,
    pub description: String,
}

/// A date with legal significance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalDate {
    pub date: String,
    pub event: String,
}

/// A party to the agreement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub name: String,
    pub role: String,
}

/// Something a party must do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Obligation {
    pub party: String,
    pub responsibility: String,
}

/// An identified risk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    pub risk: String,
    /// "high", "medium" or "low" as reported by the model.
    pub severity: String,
    pub description: String,
}

/// A clause the document should contain but does not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingClause {
    pub clause: String,
    pub importance: String,
}

/// A compliance concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceIssue {
    pub issue: String,
    pub regulation: String,
}

/// The 12-category structured analysis produced by an analysis backend.
///
/// Only `summary` is required when decoding; every list defaults to empty so
/// a decoded record is always fully shaped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub summary: String,
    #[serde(default)]
    pub key_terms: Vec<KeyTerm>,
    #[serde(default)]
    pub main_clauses: Vec<Clause>,
    #[serde(default)]
    pub critical_dates: Vec<CriticalDate>,
    #[serde(default)]
    pub parties: Vec<Party>,
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub obligations: Vec<Obligation>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub missing_clauses: Vec<MissingClause>,
    #[serde(default)]
    pub compliance_issues: Vec<ComplianceIssue>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// Coarse bucket for a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// Structural complexity derived from clause, risk and party counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Learner output attached to an outgoing analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningInsights {
    pub quality_score: f64,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
}

/// An analysis merged with the learner's quality prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedAnalysis {
    #[serde(flatten)]
    pub analysis: DocumentAnalysis,
    pub learning_insights: LearningInsights,
    pub document_complexity: Complexity,
}

/// Predicted quality of the analysis for a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityPrediction {
    /// Probability that users will rate the analysis favourably.
    pub quality_score: f64,
    /// Probability of the most likely class; 0 means "do not trust".
    pub confidence: f64,
}

impl QualityPrediction {
    /// Neutral prediction used before any training has happened.
    pub fn cold_start() -> Self {
        Self {
            quality_score: crate::defaults::COLD_START_SCORE,
            confidence: crate::defaults::COLD_START_CONFIDENCE,
        }
    }

    /// Prediction used when the trained model failed to evaluate.
    pub fn untrusted() -> Self {
        Self {
            quality_score: crate::defaults::COLD_START_SCORE,
            confidence: 0.0,
        }
    }
}

// =============================================================================
// FEEDBACK TYPES
// =============================================================================

/// Validated user ratings of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    /// 1-5
    pub accuracy: f64,
    /// 1-5
    pub relevance: f64,
    /// 1-5
    pub completeness: f64,
    /// 1-5
    pub overall_rating: f64,
    pub comments: String,
    pub improvement_suggestions: String,
}

/// One row of the feedback journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub document_id: String,
    /// First 500 characters of the rated document.
    pub original_document_snippet: String,
    /// The analysis the user rated, stored verbatim.
    pub analysis_result: JsonValue,
    pub feedback: UserFeedback,
    pub processed: bool,
}

/// Acknowledgement returned to the submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    pub message: String,
    pub feedback_id: u64,
    pub processed: bool,
}

impl FeedbackReceipt {
    pub fn received(feedback_id: u64) -> Self {
        Self {
            message: "Feedback received successfully".to_string(),
            feedback_id,
            processed: false,
        }
    }
}

/// Mean rating per dimension, rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageRatings {
    pub accuracy: f64,
    pub relevance: f64,
    pub completeness: f64,
    pub overall: f64,
}

/// Aggregate view over the feedback journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub total_feedback: usize,
    pub average_ratings: AverageRatings,
    /// Up to five most recent entries, oldest first.
    pub recent_feedback: Vec<FeedbackEntry>,
}

// =============================================================================
// PERFORMANCE TYPES
// =============================================================================

/// Retrospective fit quality of the quality model over its own corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelPerformance {
    /// Fewer samples than needed for a meaningful readout.
    InsufficientData { message: String },
    Metrics {
        accuracy: f64,
        precision: f64,
        recall: f64,
        f1_score: f64,
        total_samples: usize,
    },
}

impl ModelPerformance {
    pub fn insufficient_data() -> Self {
        ModelPerformance::InsufficientData {
            message: "Not enough feedback data to calculate metrics".to_string(),
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, ModelPerformance::InsufficientData { .. })
    }
}

/// Combined feedback and model health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPerformance {
    pub feedback_summary: FeedbackSummary,
    pub model_performance: ModelPerformance,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reject_reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(RejectReason::EmptyText).unwrap(),
            json!("empty_text")
        );
        assert_eq!(RejectReason::LowConfidence.to_string(), "low_confidence");
    }

    #[test]
    fn test_empty_text_result_is_all_zero() {
        let result = ClassificationResult::empty_text();
        assert!(!result.accepted);
        assert_eq!(result.chunks, 0);
        assert_eq!(result.votes, 0);
        assert_eq!(result.vote_ratio, 0.0);
        assert_eq!(result.heuristic, 0.0);
        assert_eq!(result.reason, Some(RejectReason::EmptyText));
    }

    #[test]
    fn test_accepted_result_omits_reason() {
        let result = ClassificationResult {
            accepted: true,
            chunks: 1,
            votes: 1,
            vote_ratio: 1.0,
            heuristic: 0.5,
            avg_chunk_score: 0.5,
            reason: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn test_analysis_decodes_with_only_summary() {
        let analysis: DocumentAnalysis =
            serde_json::from_value(json!({"summary": "A lease."})).unwrap();
        assert_eq!(analysis.summary, "A lease.");
        assert!(analysis.key_terms.is_empty());
        assert!(analysis.next_steps.is_empty());
        assert_eq!(analysis.jurisdiction, "");
    }

    #[test]
    fn test_analysis_without_summary_is_rejected() {
        let decoded = serde_json::from_value::<DocumentAnalysis>(json!({"risks": []}));
        assert!(decoded.is_err());
    }

    #[test]
    fn test_analysis_item_tolerates_missing_fields() {
        let analysis: DocumentAnalysis = serde_json::from_value(json!({
            "summary": "s",
            "risks": [{"risk": "Late fees"}]
        }))
        .unwrap();
        assert_eq!(analysis.risks[0].risk, "Late fees");
        assert_eq!(analysis.risks[0].severity, "");
    }

    #[test]
    fn test_enriched_analysis_flattens_base_fields() {
        let enriched = EnrichedAnalysis {
            analysis: DocumentAnalysis {
                summary: "s".into(),
                ..Default::default()
            },
            learning_insights: LearningInsights {
                quality_score: 0.5,
                confidence: 0.5,
                confidence_level: ConfidenceLevel::Medium,
            },
            document_complexity: Complexity::Low,
        };
        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["summary"], "s");
        assert_eq!(value["learning_insights"]["confidence_level"], "medium");
        assert_eq!(value["document_complexity"], "low");
    }

    #[test]
    fn test_quality_prediction_defaults() {
        assert_eq!(
            QualityPrediction::cold_start(),
            QualityPrediction {
                quality_score: 0.5,
                confidence: 0.5
            }
        );
        assert_eq!(QualityPrediction::untrusted().confidence, 0.0);
    }

    #[test]
    fn test_model_performance_untagged_shapes() {
        let sentinel = serde_json::to_value(ModelPerformance::insufficient_data()).unwrap();
        assert_eq!(
            sentinel,
            json!({"message": "Not enough feedback data to calculate metrics"})
        );

        let metrics = ModelPerformance::Metrics {
            accuracy: 1.0,
            precision: 1.0,
            recall: 1.0,
            f1_score: 1.0,
            total_samples: 2,
        };
        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value["total_samples"], 2);
        assert!(!metrics.is_insufficient());
    }

    #[test]
    fn test_feedback_receipt_received() {
        let receipt = FeedbackReceipt::received(3);
        assert_eq!(receipt.feedback_id, 3);
        assert!(!receipt.processed);
        assert_eq!(receipt.message, "Feedback received successfully");
    }
}
