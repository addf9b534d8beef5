//! Prompt composition for grounded answers

pub mod prompt;

pub use prompt::PromptBuilder;
