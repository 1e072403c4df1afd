//! Conversation state: an append-only, chronologically ordered turn log

use parking_lot::RwLock;

use crate::types::Turn;

/// Turn history owned by one session.
///
/// `append` is the only mutator besides `clear`, which truncates everything.
/// No limit is imposed here; callers choose how much history to use.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: RwLock<Vec<Turn>>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn
    pub fn append(&self, turn: Turn) {
        self.turns.write().push(turn);
    }

    /// Append several turns atomically with respect to readers
    pub fn extend(&self, turns: impl IntoIterator<Item = Turn>) {
        self.turns.write().extend(turns);
    }

    /// Snapshot of every turn, oldest first
    pub fn history(&self) -> Vec<Turn> {
        self.turns.read().clone()
    }

    /// Snapshot of the last `n` turns, oldest first
    pub fn recent(&self, n: usize) -> Vec<Turn> {
        let turns = self.turns.read();
        let start = turns.len().saturating_sub(n);
        turns[start..].to_vec()
    }

    /// Drop all turns
    pub fn clear(&self) {
        self.turns.write().clear();
    }

    pub fn len(&self) -> usize {
        self.turns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.read().is_empty()
    }
}
