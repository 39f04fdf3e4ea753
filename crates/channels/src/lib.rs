//! Input channels and output sinks for rollchat.
//!
//! Available implementations:
//! - **CLI** — lines from stdin
//! - **Terminal** — paced output to stdout
//! - **Scripted / Buffer** — fixed input and recorded output, for tests and replays

pub mod cli;
pub mod scripted;
pub mod terminal;

pub use cli::CliChannel;
pub use scripted::{BufferSink, ScriptedChannel, SinkEvent};
pub use terminal::{Pacing, TerminalSink};
