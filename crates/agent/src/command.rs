//! Interactive command parsing.

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Persist and end the session
    Quit,
    /// Drop the in-memory transcript without persisting
    Clear,
    /// Persist and keep going
    Save,
    /// Nothing but whitespace
    Empty,
    /// A conversational message, trimmed
    Message(String),
}

impl Input {
    /// Commands match case-insensitively after trimming.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Input::Empty;
        }
        match trimmed.to_lowercase().as_str() {
            "quit" => Input::Quit,
            "clear" => Input::Clear,
            "save" => Input::Save,
            _ => Input::Message(trimmed.to_string()),
        }
    }
}
