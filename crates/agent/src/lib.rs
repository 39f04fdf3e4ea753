//! The conversational core of rollchat.
//!
//! Each user line goes through one step:
//!
//! 1. **Append** the user turn to the transcript
//! 2. **Compact** older turns into a summary once the transcript is too long
//! 3. **Complete** the flattened transcript, retrying while the model is overloaded
//! 4. **Record** the reply as an assistant turn (or report that there was none)
//!
//! A failure anywhere in the step is saved, shown, and the loop carries on.

pub mod command;
pub mod compaction;
pub mod completion;
pub mod session;
pub mod summarizer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use command::Input;
pub use compaction::{CompactionOutcome, CompactionPolicy};
pub use completion::CompletionClient;
pub use session::{ChatSession, Control};
pub use summarizer::Summarizer;
