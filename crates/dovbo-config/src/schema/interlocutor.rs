//! Conversation behaviour: persona, history window, polling and phrases.

use serde::{Deserialize, Serialize};

/// `[interlocutor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterlocutorConfig {
    /// Name the bot goes by; used as the recipient of situational prompts.
    pub bot_identity: String,
    /// Bounded history window per chat (valid range: 1-10000).
    pub history_size: u32,
    /// Pinned system message kept ahead of the history window.
    pub system_prompt: Option<String>,
    /// Run status poll interval in milliseconds (valid range: 50-60000).
    pub poll_interval_ms: u32,
    /// Give up on a run after this many polls. Unset means wait forever.
    pub max_poll_attempts: Option<u32>,
    /// Append the reply's `debug` field to outgoing messages.
    pub show_debug: bool,
    pub common_phrases: CommonPhrasesConfig,
}

impl Default for InterlocutorConfig {
    fn default() -> Self {
        Self {
            bot_identity: "dovbobot".into(),
            history_size: 100,
            system_prompt: None,
            poll_interval_ms: 500,
            max_poll_attempts: None,
            show_debug: false,
            common_phrases: CommonPhrasesConfig::default(),
        }
    }
}

/// `[interlocutor.common_phrases]`: templates for situational prompts.
///
/// Templates use `{placeholder}` interpolation; which placeholders are
/// accepted depends on the situation (see `validation`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonPhrasesConfig {
    pub bot_says_hi: String,
    pub bot_joins_chat: String,
    pub user_joins_chat: String,
    pub user_leaves_chat: String,
    pub user_invited_to_chat: String,
    pub user_kicked_from_chat: String,
}

impl Default for CommonPhrasesConfig {
    fn default() -> Self {
        Self {
            bot_says_hi: "{user_name} has just started a private chat with you. Say hi.".into(),
            bot_joins_chat: "You have been added to the group {group_name}. Introduce yourself."
                .into(),
            user_joins_chat: "{user_name} has joined the chat. Greet them.".into(),
            user_leaves_chat: "{user_name} has left the chat.".into(),
            user_invited_to_chat: "{inviter_name} has invited {user_name} to the chat. Greet them."
                .into(),
            user_kicked_from_chat: "{kicker_name} has removed {user_name} from the chat.".into(),
        }
    }
}
