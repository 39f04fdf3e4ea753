//! Completion provider implementations for rollchat.
//!
//! All providers implement the `rollchat_core::Provider` trait. Retry and
//! overload handling live in `rollchat-agent`, not here.

pub mod gemini;

pub use gemini::GeminiProvider;
