//! Configuration schema.
//!
//! Every section is `#[serde(default)]` so a TOML file only needs the keys it
//! wants to change.

mod interlocutor;
mod openai;
mod system;
mod telegram;

pub use interlocutor::{CommonPhrasesConfig, InterlocutorConfig};
pub use openai::OpenAiConfig;
pub use system::{LogFormat, LogLevel, LoggingConfig};
pub use telegram::TelegramConfig;

use serde::{Deserialize, Serialize};

pub(crate) const REDACTED: &str = "[REDACTED]";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DovboConfig {
    pub openai: OpenAiConfig,
    pub telegram: TelegramConfig,
    pub interlocutor: InterlocutorConfig,
    pub logging: LoggingConfig,
}

impl DovboConfig {
    /// Copy of the config with credentials replaced, safe to log.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.openai.api_key.is_empty() {
            copy.openai.api_key = REDACTED.into();
        }
        if !copy.telegram.token.is_empty() {
            copy.telegram.token = REDACTED.into();
        }
        copy
    }
}
