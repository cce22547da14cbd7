//! Conversation engine for dovbobot.
//!
//! Bridges chat events to a stateful assistant backend that runs one job at a
//! time per thread:
//! - Per-chat sessions with bounded history and a serialization gate
//! - A run coordinator that submits, polls and collects replies
//! - Translation of chat lifecycle events into prompt envelopes
//! - Decoding and dispatch of reply fragments
//! - An OpenAI Assistants API client

pub mod coordinator;
pub mod dispatcher;
pub mod envelope;
pub mod interlocutor;
pub mod openai;
pub mod registry;
pub mod session;
pub mod translator;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

pub use coordinator::{PollPolicy, RunCoordinator};
pub use dispatcher::{ChatSender, ResponseDispatcher};
pub use envelope::{
    EnvelopeContent, EnvelopeKind, FragmentContent, FragmentKind, PromptEnvelope, ResponseFragment,
};
pub use interlocutor::{Interlocutor, InterlocutorOptions};
pub use openai::{AssistantsConfig, OpenAiAssistantsClient};
pub use registry::{SessionRegistry, SessionSettings};
pub use session::{RunGuard, Session};
pub use translator::{ChatEvent, PhraseBook, PhraseKey, Situation, Translator};

/// The assistant backend: persistent threads, messages on them, and runs
/// that turn a thread's messages into new assistant messages.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Allocate a new thread and return its id.
    async fn create_thread(&self) -> Result<String, AiError>;

    async fn delete_thread(&self, thread_id: &str) -> Result<(), AiError>;

    /// Append a message to a thread and return the message id.
    async fn post_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, AiError>;

    /// Start a run over the thread with the configured assistant.
    async fn start_run(&self, thread_id: &str) -> Result<RunHandle, AiError>;

    async fn get_run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AiError>;

    /// Ask the backend to stop a run. The run passes through `cancelling`
    /// before it reaches a terminal status.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AiError>;

    /// Messages created after `after` (or all, if `None`), oldest first.
    async fn list_messages(
        &self,
        thread_id: &str,
        after: Option<&str>,
    ) -> Result<Vec<BackendMessage>, AiError>;
}

/// A history record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Lifecycle status of a backend run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Still worth polling.
    pub fn is_pending(self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }

    /// The run no longer occupies its thread.
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            RunStatus::Queued
                | RunStatus::InProgress
                | RunStatus::RequiresAction
                | RunStatus::Cancelling
        )
    }
}

/// A run started on a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
}

/// One content block of a backend message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSegment {
    Text(String),
    /// Non-text block (image, file reference, ...), kept by type name only.
    Other(String),
}

/// A message as stored on a backend thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendMessage {
    pub id: String,
    pub role: Role,
    pub content: Vec<ContentSegment>,
}

impl BackendMessage {
    /// Text segments in document order.
    pub fn text_segments(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|segment| match segment {
            ContentSegment::Text(text) => Some(text.as_str()),
            ContentSegment::Other(_) => None,
        })
    }
}

/// Backend transport failures.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Failures while handling one chat event.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Backend(#[from] AiError),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("delivery error: {0}")]
    Delivery(String),
}
