//! JSON envelopes exchanged with the assistant.
//!
//! Outgoing prompts are `{"type", "content": {"recipient", "sender",
//! "message"}, "timestamp"}`. The assistant answers with fragments of the
//! same shape whose content carries `message` and an optional `debug` note.

use serde::{Deserialize, Serialize};

use crate::BotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    /// Something a chat participant said.
    Message,
    /// A situational instruction addressed to the bot itself.
    Prompt,
    /// Assistant's way of saying "nothing to send".
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeContent {
    pub recipient: Option<String>,
    pub sender: Option<String>,
    pub message: String,
}

/// A prompt submitted to the backend as the text of a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEnvelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub content: EnvelopeContent,
    /// Unix seconds.
    pub timestamp: i64,
}

impl PromptEnvelope {
    /// A participant's words, timestamped now.
    pub fn message(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: EnvelopeKind::Message,
            content: EnvelopeContent {
                recipient: None,
                sender: Some(sender.into()),
                message: text.into(),
            },
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// An instruction to the bot identified by `recipient`, timestamped now.
    pub fn prompt(recipient: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: EnvelopeKind::Prompt,
            content: EnvelopeContent {
                recipient: Some(recipient.into()),
                sender: None,
                message: text.into(),
            },
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Compact JSON; field order is fixed by the struct layout.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Message,
    Prompt,
    Noop,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FragmentContent {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub debug: Option<String>,
}

/// One decoded reply from the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseFragment {
    #[serde(rename = "type")]
    pub kind: FragmentKind,
    #[serde(default)]
    pub content: FragmentContent,
}

impl ResponseFragment {
    pub fn decode(raw: &str) -> Result<Self, BotError> {
        serde_json::from_str(raw).map_err(|e| BotError::MalformedResponse(e.to_string()))
    }

    pub fn is_noop(&self) -> bool {
        self.kind == FragmentKind::Noop
    }
}
