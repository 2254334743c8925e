//! # klarity-inference
//!
//! Analysis backends for klarity.
//!
//! This crate provides:
//! - An OpenAI-compatible chat-completions backend producing the 12-category
//!   document analysis
//! - A fixed fallback analysis
//! - A resilient wrapper that substitutes the fallback on any failure
//!
//! # Feature Flags
//!
//! - `mock`: expose [`mock::MockAnalysisBackend`] to dependent crates' tests

pub mod fallback;
pub mod openai;
pub mod prompt;
pub mod resilient;

// Mock analysis backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use fallback::{fallback_analysis, FallbackAnalysis};
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use prompt::{build_analysis_prompt, parse_analysis};
pub use resilient::ResilientAnalyzer;
