//! # klarity-db
//!
//! Durable feedback storage for klarity.
//!
//! Feedback is validated, stamped with a monotonically increasing id, and
//! appended to a JSON Lines journal. The journal is the single source of truth;
//! the in-memory view is rebuilt from it on open.

pub mod journal;
pub mod validation;

pub use journal::{FeedbackJournal, JournalRecord};
pub use validation::{document_snippet, validate_feedback};
