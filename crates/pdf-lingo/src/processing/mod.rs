//! Document processing pipeline

mod mapping;
mod pipeline;

pub use mapping::{assign_translated_lines, order_blocks, page_prompt_text};
pub use pipeline::DocumentProcessor;
