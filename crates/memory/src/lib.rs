//! Transcript store implementations for rollchat.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::JsonFileStore;
pub use in_memory::InMemoryStore;
