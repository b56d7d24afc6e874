//! Provider abstractions for the language model backend

pub mod gemini;
pub mod llm;

pub use gemini::{GeminiClient, ModelInfo};
pub use llm::LlmProvider;
