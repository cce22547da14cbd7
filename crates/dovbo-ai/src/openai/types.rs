//! Wire types for the Assistants endpoints. Only the fields we read.

use serde::{Deserialize, Serialize};

use crate::{BackendMessage, ContentSegment, Role, RunStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct ThreadObject {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeletedObject {
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunObject {
    pub id: String,
    pub thread_id: String,
    pub status: RunStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageObject {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextValue {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRun<'a> {
    pub assistant_id: &'a str,
}

impl From<ContentPart> for ContentSegment {
    fn from(part: ContentPart) -> Self {
        match (part.kind.as_str(), part.text) {
            ("text", Some(text)) => ContentSegment::Text(text.value),
            _ => ContentSegment::Other(part.kind),
        }
    }
}

impl From<MessageObject> for BackendMessage {
    fn from(message: MessageObject) -> Self {
        BackendMessage {
            id: message.id,
            role: message.role,
            content: message.content.into_iter().map(Into::into).collect(),
        }
    }
}
