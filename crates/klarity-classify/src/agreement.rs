//! Agreement screening by cue-keyword voting.
//!
//! A document is scored chunk by chunk against a fixed list of section cues
//! ("termination", "governing law", ...). Each chunk whose share of distinct
//! cues reaches [`defaults::CHUNK_VOTE_THRESHOLD`] casts a vote. The document
//! is accepted when enough chunks vote, or when the whole text carries enough
//! cues on its own.
//!
//! Screening runs before any expensive analysis and is a pure function of its
//! input text.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use klarity_core::{defaults, ClassificationResult, RejectReason};

use crate::chunking::WordChunker;

/// Section cues that signal an agreement.
pub const SECTION_CUES: &[&str] = &[
    "agreement",
    "security deposit",
    "rental period",
    "payment terms",
    "termination",
    "arbitration",
    "jurisdiction",
    "witness",
    "signatory",
    "governing law",
    "parties",
    "definitions",
    "probation period",
    "internship duration",
    "performance",
    "salary",
    "compensation",
    "notice period",
    "work expectations",
    "attendance",
    "leaves",
    "certificate",
    "offer letter",
];

static DEFAULT_SCORER: Lazy<CueScorer> = Lazy::new(|| CueScorer::new(SECTION_CUES));

/// Scores text by the fraction of distinct cues it contains.
#[derive(Debug, Clone)]
pub struct CueScorer {
    patterns: Vec<Regex>,
}

impl CueScorer {
    /// Build a scorer for the given cues. Cues match case-insensitively as
    /// whole words (or whole phrases for multi-word cues).
    pub fn new(cues: &[&str]) -> Self {
        let patterns = cues
            .iter()
            .filter_map(|cue| {
                let pattern = format!(r"\b{}\b", regex::escape(&cue.to_lowercase()));
                Regex::new(&pattern).ok()
            })
            .collect();
        Self { patterns }
    }

    /// Number of cues this scorer checks.
    pub fn cue_count(&self) -> usize {
        self.patterns.len()
    }

    /// Number of distinct cues present in `text`.
    pub fn matches(&self, text: &str) -> usize {
        let lowered = text.to_lowercase();
        self.patterns
            .iter()
            .filter(|p| p.is_match(&lowered))
            .count()
    }

    /// Distinct cues found divided by the size of the cue list, in [0, 1].
    pub fn score(&self, text: &str) -> f64 {
        self.matches(text) as f64 / self.cue_count().max(1) as f64
    }
}

/// Cue score of `text` against [`SECTION_CUES`].
pub fn heuristic_score(text: &str) -> f64 {
    DEFAULT_SCORER.score(text)
}

/// Screens documents for agreement-like content.
#[derive(Debug, Clone)]
pub struct AgreementClassifier {
    scorer: CueScorer,
    chunker: WordChunker,
}

impl Default for AgreementClassifier {
    fn default() -> Self {
        Self {
            scorer: DEFAULT_SCORER.clone(),
            chunker: WordChunker::default(),
        }
    }
}

impl AgreementClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier using a custom cue list.
    pub fn with_cues(cues: &[&str]) -> Self {
        Self {
            scorer: CueScorer::new(cues),
            chunker: WordChunker::default(),
        }
    }

    /// Replace the chunker.
    pub fn with_chunker(mut self, chunker: WordChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Decide whether `text` is an agreement.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        if text.trim().is_empty() {
            debug!(reason = %RejectReason::EmptyText, "Rejected document");
            return ClassificationResult::empty_text();
        }

        let chunk_scores: Vec<f64> = self
            .chunker
            .chunk(text)
            .iter()
            .map(|chunk| self.scorer.score(chunk))
            .collect();
        let heuristic = self.scorer.score(text);

        let result = decide(&chunk_scores, heuristic);
        debug!(
            accepted = result.accepted,
            chunk_count = result.chunks,
            votes = result.votes,
            vote_ratio = result.vote_ratio,
            heuristic = result.heuristic,
            "Classified document"
        );
        result
    }
}

/// Combine per-chunk scores and the whole-text score into a decision.
///
/// Acceptance is decided on unrounded ratios; the reported values are rounded
/// to three decimals.
pub fn decide(chunk_scores: &[f64], heuristic: f64) -> ClassificationResult {
    let chunks = chunk_scores.len();
    let votes = chunk_scores
        .iter()
        .filter(|s| **s >= defaults::CHUNK_VOTE_THRESHOLD)
        .count();
    let vote_ratio = if chunks > 0 {
        votes as f64 / chunks as f64
    } else {
        0.0
    };
    let avg_chunk_score = chunk_scores.iter().sum::<f64>() / chunks.max(1) as f64;

    let accepted =
        vote_ratio >= defaults::VOTE_RATIO_THRESHOLD || heuristic >= defaults::HEURISTIC_THRESHOLD;

    ClassificationResult {
        accepted,
        chunks,
        votes,
        vote_ratio: round3(vote_ratio),
        heuristic: round3(heuristic),
        avg_chunk_score: round3(avg_chunk_score),
        reason: (!accepted).then_some(RejectReason::LowConfidence),
    }
}

/// Classify with the default cue list and chunking.
pub fn classify_agreement(text: &str) -> ClassificationResult {
    AgreementClassifier::default().classify(text)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
