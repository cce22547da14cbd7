//! Session registry: one `Session` per chat id, created on first use.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dovbo_common::ChatId;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::session::Session;
use crate::{AiError, AssistantBackend};

/// Parameters applied to every new session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub history_size: usize,
    pub system_prompt: Option<String>,
    /// Gate re-check interval used by `reset`.
    pub gate_recheck: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_size: 100,
            system_prompt: None,
            gate_recheck: Duration::from_millis(500),
        }
    }
}

type Slot = Arc<OnceCell<Arc<Session>>>;

/// Maps chat ids to sessions.
///
/// Each chat gets a slot that is initialised at most once, so concurrent
/// first events for the same chat share a single session and a single
/// backend thread, while different chats never wait on each other's
/// thread allocation.
pub struct SessionRegistry {
    backend: Arc<dyn AssistantBackend>,
    settings: SessionSettings,
    sessions: RwLock<HashMap<ChatId, Slot>>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn AssistantBackend>, settings: SessionSettings) -> Self {
        Self {
            backend,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return the chat's session, allocating a backend thread on first use.
    ///
    /// If allocation fails the error is returned and the next call retries.
    pub async fn get_or_create(&self, chat_id: ChatId) -> Result<Arc<Session>, AiError> {
        let slot = self.slot(chat_id).await;
        let session = slot
            .get_or_try_init(|| async {
                let thread_id = self.backend.create_thread().await?;
                info!(%chat_id, %thread_id, "created session");
                let mut session =
                    Session::new(chat_id, thread_id, self.settings.history_size);
                if let Some(prompt) = &self.settings.system_prompt {
                    session = session.with_system_prompt(prompt.as_str());
                }
                Ok::<_, AiError>(Arc::new(session))
            })
            .await?;
        Ok(Arc::clone(session))
    }

    async fn slot(&self, chat_id: ChatId) -> Slot {
        if let Some(slot) = self.sessions.read().await.get(&chat_id) {
            return Arc::clone(slot);
        }
        let mut map = self.sessions.write().await;
        Arc::clone(map.entry(chat_id).or_default())
    }

    /// The chat's session, if one has been created.
    pub async fn get(&self, chat_id: ChatId) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .await
            .get(&chat_id)
            .and_then(|slot| slot.get().cloned())
    }

    /// Drop the mapping. The backend thread is left alone.
    pub async fn remove(&self, chat_id: ChatId) -> Option<Arc<Session>> {
        let slot = self.sessions.write().await.remove(&chat_id)?;
        debug!(%chat_id, "removed session");
        slot.get().cloned()
    }

    /// Rotate the chat's backend thread and clear its local history.
    ///
    /// Waits for any in-flight run first. The new thread is allocated before
    /// the old one is deleted, so an allocation failure leaves the session
    /// untouched. Returns `None` if the chat has no session.
    pub async fn reset(&self, chat_id: ChatId) -> Result<Option<Arc<Session>>, AiError> {
        let Some(session) = self.get(chat_id).await else {
            return Ok(None);
        };

        let old_thread = {
            let _guard = session.acquire_run(self.settings.gate_recheck).await;
            let new_thread = self.backend.create_thread().await?;
            let old_thread = session.thread_id();
            session.set_thread_id(new_thread.as_str());
            session.clear_history();
            info!(%chat_id, %old_thread, %new_thread, "reset session");
            old_thread
        };

        if let Err(e) = self.backend.delete_thread(&old_thread).await {
            warn!(%chat_id, thread_id = %old_thread, error = %e, "failed to delete old thread");
        }
        Ok(Some(session))
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
