//! Turn and Transcript domain types.
//!
//! These are the value objects that flow through the whole session:
//! the user types a line → it becomes a `Turn` → the `Transcript` is
//! compacted and flattened → the provider's reply becomes another `Turn`.

use serde::{Deserialize, Serialize};

/// Label prefixed to the synthetic turn that carries the rolling summary.
pub const SUMMARY_LABEL: &str = "Conversation summary: ";

/// The role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Rolling summary of compacted turns
    System,
}

impl Role {
    /// Capitalized name used when flattening a transcript to text.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        }
    }
}

/// A single conversational unit.
///
/// Fields are private so a turn cannot be edited once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create the synthetic summary turn that heads a compacted transcript.
    pub fn summary(summary_text: &str) -> Self {
        Self::new(Role::System, format!("{SUMMARY_LABEL}{summary_text}"))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Render as `"<Role>: <content>"`.
    pub fn render(&self) -> String {
        format!("{}: {}", self.role.label(), self.content)
    }
}

/// Flatten turns into one plain-text block, one `"<Role>: <content>"` entry
/// per turn, joined by newlines.
///
/// The upstream service takes a single text input, so multi-role structure
/// has to be carried in the text itself.
pub fn flatten(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(Turn::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// An ordered, chronological sequence of turns.
///
/// Serializes as a bare JSON array of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Read-only view of all turns.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The rolling summary turn, if the transcript has been compacted.
    pub fn summary(&self) -> Option<&Turn> {
        self.turns.first().filter(|t| t.role == Role::System)
    }

    /// Drop every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Flatten the whole transcript for transmission.
    pub fn flatten(&self) -> String {
        flatten(&self.turns)
    }

    /// Split into the compactable prefix and the last `recent_keep` turns.
    ///
    /// When `recent_keep >= len` the prefix is empty.
    pub fn split_recent(&self, recent_keep: usize) -> (&[Turn], &[Turn]) {
        let boundary = self.turns.len().saturating_sub(recent_keep);
        self.turns.split_at(boundary)
    }

    /// Replace everything but the last `recent_keep` turns with one summary
    /// turn. Returns the number of turns that were folded into the summary.
    pub fn compact(&mut self, summary_text: &str, recent_keep: usize) -> usize {
        let boundary = self.turns.len().saturating_sub(recent_keep);
        let recent = self.turns.split_off(boundary);
        let mut compacted = Vec::with_capacity(recent.len() + 1);
        compacted.push(Turn::summary(summary_text));
        compacted.extend(recent);
        self.turns = compacted;
        boundary
    }

    /// Whether the single-summary-at-head invariant holds.
    pub fn is_well_formed(&self) -> bool {
        self.turns
            .iter()
            .skip(1)
            .all(|t| t.role != Role::System)
    }
}
