//! Per-chat session state.
//!
//! A `Session` holds the bounded conversation history, the backend thread
//! the chat is bound to, and the gate that keeps at most one run in flight.

mod history;
mod manager;
mod types;

pub use history::History;
pub use manager::Session;
pub use types::RunGuard;
