//! Telegram transport settings.

use serde::{Deserialize, Serialize};

/// `[telegram]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    /// Long-poll timeout passed to `getUpdates` (valid range: 0-50).
    pub poll_timeout_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            poll_timeout_secs: 30,
        }
    }
}
