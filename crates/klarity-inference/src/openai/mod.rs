//! OpenAI-compatible analysis backend.
//!
//! Works with any endpoint that speaks the chat-completions protocol,
//! including:
//!
//! - OpenAI cloud API
//! - Azure OpenAI
//! - Ollama (in OpenAI compatibility mode)
//! - vLLM
//! - LM Studio
//!
//! # Example
//!
//! ```rust,no_run
//! use klarity_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use klarity_core::AnalysisBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         base_url: "http://localhost:11434/v1".to_string(),
//!         model: "llama3".to_string(),
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!     let analysis = backend.analyze("This lease...", "rental agreement").await.unwrap();
//!     println!("{}", analysis.summary);
//! }
//! ```

mod backend;
mod types;

pub use backend::{endpoint_error, OpenAIBackend, OpenAIConfig};
pub use types::*;
