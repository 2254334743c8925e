//! # klarity-classify
//!
//! Agreement screening for klarity.
//!
//! This crate provides:
//! - Word chunking bounded to the first 3000 words
//! - Cue-keyword voting that accepts or rejects a document as an agreement
//! - Document-type detection used to tag accepted documents

pub mod agreement;
pub mod chunking;
pub mod document_type;

pub use agreement::{
    classify_agreement, decide, heuristic_score, AgreementClassifier, CueScorer, SECTION_CUES,
};
pub use chunking::{chunk_words, WordChunker, WordChunkerConfig};
pub use document_type::{detect_document_type, DOCUMENT_TYPES};
