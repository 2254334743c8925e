//! # klarity-core
//!
//! Core types, traits, and abstractions for the klarity agreement analyzer.
//!
//! This crate provides the shared data structures and trait definitions that
//! the classifier, feedback store, analysis backends and learning loop depend
//! on.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
