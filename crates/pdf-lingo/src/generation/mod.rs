//! Prompt construction and reply parsing

mod parse;
mod prompt;

pub use parse::{detection_from_value, extract_json_object, parse_language_detection};
pub use prompt::PromptBuilder;
