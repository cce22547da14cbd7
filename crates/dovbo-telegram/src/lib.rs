//! Telegram Bot API transport for dovbobot.
//!
//! Long-polls `getUpdates`, maps updates to [`dovbo_ai::ChatEvent`]s and
//! delivers replies with `sendMessage`.

pub mod client;
pub mod poller;
pub mod updates;

pub use client::TelegramClient;
pub use poller::Poller;
pub use updates::{to_event, Update};

/// Errors from the Bot API.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
