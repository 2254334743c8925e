//! Deterministic document statistics stored with each training sample.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Legal vocabulary counted per document.
pub const LEGAL_KEYWORDS: [&str; 17] = [
    "agreement",
    "contract",
    "party",
    "obligation",
    "liability",
    "warranty",
    "indemnification",
    "termination",
    "jurisdiction",
    "arbitration",
    "dispute",
    "compliance",
    "regulation",
    "penalty",
    "remedy",
    "condition",
    "clause",
];

static KEYWORD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    LEGAL_KEYWORDS
        .iter()
        .filter_map(|k| Regex::new(&format!(r"\b{}\b", regex::escape(k))).ok())
        .collect()
});

/// Surface statistics of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFeatures {
    pub word_count: usize,
    /// Length in characters.
    pub char_count: usize,
    /// Mean characters per whitespace-delimited word; 0 for empty text.
    pub avg_word_length: f64,
    /// Whole-word occurrences of each [`LEGAL_KEYWORDS`] entry, in order.
    pub legal_keyword_counts: Vec<usize>,
}

/// Compute [`DocumentFeatures`] for `text`.
pub fn extract_features(text: &str) -> DocumentFeatures {
    let word_lengths: Vec<usize> = text.split_whitespace().map(|w| w.chars().count()).collect();
    let word_count = word_lengths.len();
    let avg_word_length = if word_count == 0 {
        0.0
    } else {
        word_lengths.iter().sum::<usize>() as f64 / word_count as f64
    };

    let lowered = text.to_lowercase();
    let legal_keyword_counts = KEYWORD_PATTERNS
        .iter()
        .map(|p| p.find_iter(&lowered).count())
        .collect();

    DocumentFeatures {
        word_count,
        char_count: text.chars().count(),
        avg_word_length,
        legal_keyword_counts,
    }
}
