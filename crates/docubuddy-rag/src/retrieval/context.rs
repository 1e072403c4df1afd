//! Context assembly under a relevance floor and a character budget

use crate::config::RetrievalConfig;
use crate::generation::NO_CONTEXT_SENTINEL;
use crate::types::{Metadata, ScoredPassage};

const UNIT_SEPARATOR: &str = "\n\n";

/// Context selected for one query
#[derive(Debug, Clone)]
pub struct AssembledContext {
    /// Joined units, or the no-context sentinel when nothing was used
    pub text: String,
    /// Passages placed in the context, in rank order
    pub used: Vec<ScoredPassage>,
}

impl AssembledContext {
    /// Whether any passage cleared the floor and fit the budget
    pub fn context_found(&self) -> bool {
        !self.used.is_empty()
    }

    /// Metadata of the used passages, for citation
    pub fn sources(&self) -> Vec<Metadata> {
        self.used.iter().map(|s| s.passage.metadata.clone()).collect()
    }
}

/// Walks ranked candidates and keeps those that are relevant enough and fit.
///
/// The running length starts at the question's character count. Each unit
/// is `(content)=>{metadata}`; units after the first also pay for the blank
/// line separating them. Walking stops at the first candidate scoring at or
/// below the floor, or the first one that would bring the running length to
/// or past the budget.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    relevance_floor: f32,
    char_budget: usize,
}

impl ContextAssembler {
    pub fn new(relevance_floor: f32, char_budget: usize) -> Self {
        Self {
            relevance_floor,
            char_budget,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.relevance_floor, config.char_budget)
    }

    /// Format one passage as a context unit
    pub fn format_unit(candidate: &ScoredPassage) -> String {
        format!(
            "({})=>{}",
            candidate.passage.content,
            candidate.passage.metadata_display()
        )
    }

    /// Select and join context for `question` from candidates sorted by
    /// descending score
    pub fn assemble(&self, question: &str, candidates: &[ScoredPassage]) -> AssembledContext {
        let mut used_len = question.chars().count();
        let mut units: Vec<String> = Vec::new();
        let mut used = Vec::new();

        for candidate in candidates {
            if candidate.score <= self.relevance_floor {
                break;
            }

            let unit = Self::format_unit(candidate);
            let mut cost = unit.chars().count();
            if !units.is_empty() {
                cost += UNIT_SEPARATOR.len();
            }
            if used_len + cost >= self.char_budget {
                break;
            }

            used_len += cost;
            units.push(unit);
            used.push(candidate.clone());
        }

        tracing::debug!(
            candidates = candidates.len(),
            used = used.len(),
            context_chars = used_len,
            "Assembled context"
        );

        let text = if units.is_empty() {
            NO_CONTEXT_SENTINEL.to_string()
        } else {
            units.join(UNIT_SEPARATOR)
        };

        AssembledContext { text, used }
    }
}
