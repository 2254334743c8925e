//! Centralized default constants for klarity.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// AGREEMENT CLASSIFICATION
// =============================================================================

/// Maximum words per classification chunk.
pub const CHUNK_MAX_WORDS: usize = 300;

/// Maximum number of chunks scored per document (bounds cost at 3000 words).
pub const CHUNK_MAX_COUNT: usize = 10;

/// Minimum per-chunk cue score for the chunk to vote "agreement".
pub const CHUNK_VOTE_THRESHOLD: f64 = 0.5;

/// Minimum vote ratio for acceptance.
pub const VOTE_RATIO_THRESHOLD: f64 = 0.4;

/// Minimum whole-text cue score for acceptance.
pub const HEURISTIC_THRESHOLD: f64 = 0.4;

/// Label returned when no document-type keyword matches.
pub const GENERIC_DOCUMENT_TYPE: &str = "general legal document";

// =============================================================================
// FEEDBACK
// =============================================================================

/// Characters of the original document kept with each feedback entry.
pub const FEEDBACK_SNIPPET_CHARS: usize = 500;

/// Number of entries returned as "recent" in the feedback summary.
pub const FEEDBACK_RECENT_COUNT: usize = 5;

/// Lowest accepted rating value.
pub const RATING_MIN: f64 = 1.0;

/// Highest accepted rating value.
pub const RATING_MAX: f64 = 5.0;

/// Journal file name inside the feedback storage root.
pub const FEEDBACK_JOURNAL_FILE: &str = "feedback.jsonl";

/// Default feedback storage root.
pub const FEEDBACK_STORAGE_PATH: &str = "feedback_storage";

// =============================================================================
// QUALITY LEARNING
// =============================================================================

/// Default snapshot file for the quality model.
pub const LEARNING_MODEL_PATH: &str = "learning_model.json";

/// Retrain after every N-th feedback sample.
pub const RETRAIN_EVERY: usize = 10;

/// Maximum vocabulary size of the TF-IDF vectorizer.
pub const TFIDF_MAX_FEATURES: usize = 5000;

/// Gradient-descent epochs for the logistic-regression classifier.
pub const CLASSIFIER_EPOCHS: usize = 300;

/// Learning rate for the logistic-regression classifier.
pub const CLASSIFIER_LEARNING_RATE: f64 = 0.5;

/// L2 regularisation strength for the logistic-regression classifier.
pub const CLASSIFIER_L2: f64 = 0.01;

/// Prediction returned before the model has ever been trained.
pub const COLD_START_SCORE: f64 = 0.5;

/// Confidence returned before the model has ever been trained.
pub const COLD_START_CONFIDENCE: f64 = 0.5;

/// Minimum corpus size for performance metrics.
pub const METRICS_MIN_SAMPLES: usize = 2;

// =============================================================================
// COORDINATOR
// =============================================================================

/// Default interval between background feedback sweeps (5 minutes).
pub const SWEEP_INTERVAL_SECS: u64 = 300;

/// Capacity of the coordinator's request channel.
pub const COORDINATOR_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the coordinator's event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default OpenAI-compatible endpoint.
pub const ANALYSIS_BASE_URL: &str = "https://api.openai.com/v1";

/// Default generation model.
pub const ANALYSIS_MODEL: &str = "gpt-4o-mini";

/// Timeout for analysis requests in seconds.
pub const ANALYSIS_TIMEOUT_SECS: u64 = 120;

/// Maximum characters of document text sent to the analysis model.
pub const ANALYSIS_MAX_INPUT_CHARS: usize = 50_000;

/// Sampling temperature for analysis generation.
pub const ANALYSIS_TEMPERATURE: f32 = 0.4;

/// Token cap for analysis generation.
pub const ANALYSIS_MAX_TOKENS: u32 = 8192;
