//! # klarity-learning
//!
//! Feedback-driven quality learning for klarity.
//!
//! This crate provides:
//! - Document features, a TF-IDF vectorizer and a logistic-regression
//!   classifier
//! - The quality learner that retrains on user feedback and predicts how an
//!   analysis will be rated
//! - Enrichment of outgoing analyses with learning insights
//! - The learning coordinator actor that owns the feedback store and the
//!   learner
//! - The analysis pipeline: classify, tag, analyze, enrich

pub mod classifier;
pub mod coordinator;
pub mod enrich;
pub mod features;
pub mod learner;
pub mod metrics;
pub mod pipeline;
pub mod vectorizer;

pub use classifier::{LogisticRegression, TrainingConfig};
pub use coordinator::{
    CoordinatorHandle, LearningConfig, LearningCoordinator, LearningEvent, RunningCoordinator,
    SweepReport,
};
pub use enrich::{confidence_level, document_complexity, enrich};
pub use features::{extract_features, DocumentFeatures, LEGAL_KEYWORDS};
pub use learner::{label_for, LearnerConfig, QualityLearner, QualityModel, TrainingSample};
pub use metrics::{classification_report, ClassificationReport};
pub use pipeline::{AnalysisPipeline, PipelineOutcome, REJECTION_MESSAGE};
pub use vectorizer::{SparseVector, TfidfVectorizer};
