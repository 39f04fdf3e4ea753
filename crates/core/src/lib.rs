//! # rollchat Core
//!
//! Domain types, traits, and error definitions for the rollchat
//! conversational agent. This crate has no I/O of its own; it defines the
//! model that the provider, store, channel and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the session loop is a trait here:
//! - `Provider` — the remote generation service
//! - `TranscriptStore` — persistence of the conversation
//! - `InputChannel` / `OutputSink` — the terminal
//!
//! Implementations live in their respective crates, which keeps the session
//! loop testable with scripted stand-ins.

pub mod channel;
pub mod error;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use channel::{InputChannel, OutputSink};
pub use error::{ChannelError, Error, ProviderError, Result, StoreError};
pub use message::{Role, Transcript, Turn, flatten};
pub use provider::{GenerationRequest, GenerationResponse, Provider, SamplingParams, Usage};
pub use store::TranscriptStore;
