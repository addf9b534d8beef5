//! Prompt templates for answer generation

use crate::retrieval::ScoredDocument;

/// Persona instruction, always first in the prompt
pub const PERSONA_INSTRUCTION: &str = "You are the best doctor.";
/// Domain restriction, always second in the prompt
pub const DOMAIN_RESTRICTION: &str = "Only provide medical-related answers.";
/// Separator between retrieved passages in the context block
pub const CONTEXT_SEPARATOR: &str = " ";

/// Prompt builder for grounded questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate retrieved page text in retrieval order
    pub fn build_context(results: &[ScoredDocument]) -> String {
        results
            .iter()
            .map(|r| r.document.text())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Persona, domain restriction, context block, question block, in that order
    pub fn build_prompt(question: &str, context: &str) -> String {
        format!(
            "{persona} {domain} Context: {context} Question: {question}",
            persona = PERSONA_INSTRUCTION,
            domain = DOMAIN_RESTRICTION,
            context = context,
            question = question
        )
    }
}
