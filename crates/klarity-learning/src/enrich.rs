//! Merging quality predictions into outgoing analyses.

use klarity_core::{
    Complexity, ConfidenceLevel, DocumentAnalysis, EnrichedAnalysis, LearningInsights,
    QualityPrediction,
};

/// Prepended when the predicted quality is below 0.3.
pub const STRONG_REVIEW_RECOMMENDATION: &str = "Highly recommended to have this document reviewed by a legal expert due to potential complexities or unusual clauses";

/// Prepended when the predicted quality is in `[0.3, 0.6)`.
pub const REVIEW_RECOMMENDATION: &str =
    "Consider having this document reviewed by a legal expert for important agreements";

pub fn confidence_level(quality_score: f64) -> ConfidenceLevel {
    if quality_score >= 0.7 {
        ConfidenceLevel::High
    } else if quality_score >= 0.4 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Complexity from `0.3 * clauses + 0.5 * risks + 0.2 * parties`.
pub fn document_complexity(analysis: &DocumentAnalysis) -> Complexity {
    let score = 0.3 * analysis.main_clauses.len() as f64
        + 0.5 * analysis.risks.len() as f64
        + 0.2 * analysis.parties.len() as f64;
    if score >= 10.0 {
        Complexity::High
    } else if score >= 5.0 {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}

/// Attach learning insights and adjust recommendations.
pub fn enrich(mut analysis: DocumentAnalysis, prediction: QualityPrediction) -> EnrichedAnalysis {
    let score = prediction.quality_score;
    let advice = if score < 0.3 {
        Some(STRONG_REVIEW_RECOMMENDATION)
    } else if score < 0.6 {
        Some(REVIEW_RECOMMENDATION)
    } else {
        None
    };
    if let Some(advice) = advice {
        analysis.recommendations.insert(0, advice.to_string());
    }

    let document_complexity = document_complexity(&analysis);
    EnrichedAnalysis {
        analysis,
        learning_insights: LearningInsights {
            quality_score: score,
            confidence: prediction.confidence,
            confidence_level: confidence_level(score),
        },
        document_complexity,
    }
}
