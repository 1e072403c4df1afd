//! Prompt templates for RAG generation
//!
//! A template is plain text with `{question}` and `{context}` placeholders and
//! an optional `{recent_history}`. Substitution is a single pass over the
//! template, so braces inside a question or a passage are never re-expanded.

use crate::error::{Error, Result};
use crate::types::Turn;

/// Context text used when no passage cleared the relevance floor
pub const NO_CONTEXT_SENTINEL: &str = "No relevant context found.";

/// Built-in template
pub const DEFAULT_TEMPLATE: &str = r#"You are DocuBuddy, an assistant that answers questions about the user's documents.

INSTRUCTIONS:
1. For questions about the documents (factual lookup, summaries, analysis), answer from the CONTEXT below and mention the source file when it helps.
2. If the CONTEXT says "No relevant context found." or does not contain the answer, say that the documents do not cover it, then answer from general knowledge only if you are confident.
3. For general-knowledge questions unrelated to the documents, answer directly without referring to the documents.
4. Be concise and precise. If the question is ambiguous, say so and ask for clarification.

RECENT CONVERSATION:
{recent_history}

CONTEXT:
{context}

QUESTION: {question}

ANSWER:"#;

const QUESTION: &str = "{question}";
const CONTEXT: &str = "{context}";
const HISTORY: &str = "{recent_history}";

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Question,
    Context,
    History,
}

/// A validated prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
    pieces: Vec<Piece>,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::parse(DEFAULT_TEMPLATE.to_string())
    }
}

impl PromptTemplate {
    /// Parse a template; fails with `Config` unless both `{question}` and
    /// `{context}` appear
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let template = Self::parse(source.into());

        for (required, piece) in [(QUESTION, Piece::Question), (CONTEXT, Piece::Context)] {
            if !template.pieces.contains(&piece) {
                return Err(Error::config(format!(
                    "prompt template must contain {}",
                    required
                )));
            }
        }

        Ok(template)
    }

    fn parse(source: String) -> Self {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = source.as_str();

        while !rest.is_empty() {
            let matched = [
                (QUESTION, Piece::Question),
                (CONTEXT, Piece::Context),
                (HISTORY, Piece::History),
            ]
            .into_iter()
            .find(|(token, _)| rest.starts_with(*token));

            match matched {
                Some((token, piece)) => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(piece);
                    rest = &rest[token.len()..];
                }
                None => {
                    let mut chars = rest.chars();
                    if let Some(c) = chars.next() {
                        literal.push(c);
                    }
                    rest = chars.as_str();
                }
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Self { source, pieces }
    }

    /// The template text as given
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template asks for conversation history
    pub fn uses_history(&self) -> bool {
        self.pieces.contains(&Piece::History)
    }

    /// Fill in the placeholders
    pub fn render(&self, question: &str, context: &str, recent_history: &str) -> String {
        let mut out = String::with_capacity(
            self.source.len() + question.len() + context.len() + recent_history.len(),
        );
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Question => out.push_str(question),
                Piece::Context => out.push_str(context),
                Piece::History => out.push_str(recent_history),
            }
        }
        out
    }
}

/// Render turns as `User: ...` / `Assistant: ...` lines
pub fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "(no previous conversation)".to_string();
    }

    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_is_valid() {
        let template = PromptTemplate::new(DEFAULT_TEMPLATE).unwrap();
        assert!(template.uses_history());
    }

    #[test]
    fn test_missing_placeholders_rejected() {
        assert!(matches!(
            PromptTemplate::new("Q: {question}"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PromptTemplate::new("C: {context}"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_render_substitutes_once() {
        let template = PromptTemplate::new("Q={question} C={context} H={recent_history}").unwrap();
        let out = template.render("what is {context}?", "(a)=>{source: x}", "none");
        assert_eq!(out, "Q=what is {context}? C=(a)=>{source: x} H=none");
    }

    #[test]
    fn test_history_optional() {
        let template = PromptTemplate::new("{context}\n{question}").unwrap();
        assert!(!template.uses_history());
        assert_eq!(template.render("q", "c", "ignored"), "c\nq");
    }

    #[test]
    fn test_unknown_braces_kept_literally() {
        let template = PromptTemplate::new("{question} {other} {context} é").unwrap();
        assert_eq!(template.render("q", "c", ""), "q {other} c é");
    }

    #[test]
    fn test_default_prompt_carries_sentinel_instructions() {
        let prompt = PromptTemplate::default().render("hi", NO_CONTEXT_SENTINEL, "");
        assert!(prompt.contains("general knowledge"));
        assert!(prompt.matches(NO_CONTEXT_SENTINEL).count() >= 2);
    }

    #[test]
    fn test_format_history() {
        let turns = vec![Turn::user("hello"), Turn::assistant("hi there", vec![])];
        assert_eq!(format_history(&turns), "User: hello\nAssistant: hi there");
        assert_eq!(format_history(&[]), "(no previous conversation)");
    }
}
