//! Decodes assistant reply fragments and forwards them to the chat.

use std::sync::Arc;

use async_trait::async_trait;
use dovbo_common::ChatId;
use tracing::{debug, warn};

use crate::envelope::ResponseFragment;
use crate::BotError;

/// Outbound side of the chat transport.
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send one text message, optionally as a reply to `reply_to`.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), BotError>;
}

pub struct ResponseDispatcher {
    sender: Arc<dyn ChatSender>,
    show_debug: bool,
}

impl ResponseDispatcher {
    pub fn new(sender: Arc<dyn ChatSender>, show_debug: bool) -> Self {
        Self { sender, show_debug }
    }

    /// Send every deliverable fragment in order and return how many were sent.
    ///
    /// Malformed, `noop` and empty fragments are skipped. The first delivery
    /// failure aborts the remaining sends.
    pub async fn dispatch(
        &self,
        chat_id: ChatId,
        fragments: &[String],
        reply_to: Option<i64>,
    ) -> Result<usize, BotError> {
        let mut sent = 0;
        for raw in fragments {
            let Some(text) = self.render(chat_id, raw) else {
                continue;
            };
            self.sender.send_text(chat_id, &text, reply_to).await?;
            sent += 1;
        }
        debug!(%chat_id, sent, total = fragments.len(), "dispatched replies");
        Ok(sent)
    }

    fn render(&self, chat_id: ChatId, raw: &str) -> Option<String> {
        let fragment = match ResponseFragment::decode(raw) {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!(%chat_id, error = %e, "dropping reply fragment");
                return None;
            }
        };
        if fragment.is_noop() {
            debug!(%chat_id, "assistant chose not to reply");
            return None;
        }

        let Some(message) = fragment.content.message else {
            warn!(%chat_id, "dropping reply fragment without a message");
            return None;
        };
        if message.trim().is_empty() {
            return None;
        }

        match fragment.content.debug {
            Some(info) if self.show_debug && !info.is_empty() => {
                Some(format!("{message}\n\nDEBUG INFO: <i>{info}</i>"))
            }
            _ => Some(message),
        }
    }
}
