//! Append-only transcript of the human/agent exchange.

use crate::models::{Role, Turn};

/// Fixed greeting shown when a session opens. Display-only: it is never sent
/// to the collaborator as context.
pub const GREETING: &str =
    "Hello! I'm the AERS Reporting Agent. I'm here to help you report any medication side effects.";

/// Ordered sequence of turns. Turns are only ever appended; the sole way to
/// remove them is a session reset, which returns to the greeting-only state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// New transcript seeded with the greeting.
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::local_agent(GREETING)],
        }
    }

    /// Rebuild from a persisted snapshot.
    pub fn restore(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Every turn, in order, including local-only ones. This is what the UI
    /// renders.
    pub fn display_view(&self) -> &[Turn] {
        &self.turns
    }

    /// The turns sent to the collaborator: local-only turns are excluded.
    pub fn context_view(&self) -> Vec<Turn> {
        self.turns.iter().filter(|t| !t.local_only).cloned().collect()
    }

    /// Owned copy of all turns, for persistence.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Text of the most recent human turn, if any.
    pub fn last_human_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Human)
            .map(|t| t.text.as_str())
    }

    /// True when nothing beyond the greeting has happened.
    pub fn is_pristine(&self) -> bool {
        self.turns.iter().all(|t| t.local_only)
    }

    /// Clear back to the greeting-only state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
