//! OpenAI Assistants API client.
//!
//! Implements `AssistantBackend` over the v2 Assistants endpoints
//! (threads, messages, runs) at https://api.openai.com/v1.

mod api;
mod client;
mod config;
mod types;

pub use client::OpenAiAssistantsClient;
pub use config::AssistantsConfig;
