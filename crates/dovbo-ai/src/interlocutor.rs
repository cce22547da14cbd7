//! The per-event pipeline: session lookup, translation, run, reply dispatch.

use std::sync::Arc;

use dovbo_common::{new_correlation_id, ChatId};
use tracing::{debug, info_span, Instrument};

use crate::coordinator::{PollPolicy, RunCoordinator};
use crate::dispatcher::{ChatSender, ResponseDispatcher};
use crate::registry::{SessionRegistry, SessionSettings};
use crate::session::Session;
use crate::translator::{ChatEvent, PhraseBook, Translator};
use crate::{AiError, AssistantBackend, BotError};

/// Everything the service needs besides its two collaborators.
#[derive(Debug, Clone)]
pub struct InterlocutorOptions {
    pub bot_identity: String,
    pub phrases: PhraseBook,
    pub history_size: usize,
    pub system_prompt: Option<String>,
    pub poll: PollPolicy,
    pub show_debug: bool,
}

/// Mediates between chats and the assistant backend.
///
/// Owns the session registry; one instance serves every chat.
pub struct Interlocutor {
    registry: SessionRegistry,
    translator: Translator,
    coordinator: RunCoordinator,
    dispatcher: ResponseDispatcher,
}

impl Interlocutor {
    pub fn new(
        backend: Arc<dyn AssistantBackend>,
        sender: Arc<dyn ChatSender>,
        options: InterlocutorOptions,
    ) -> Self {
        let settings = SessionSettings {
            history_size: options.history_size,
            system_prompt: options.system_prompt,
            gate_recheck: options.poll.interval,
        };
        Self {
            registry: SessionRegistry::new(Arc::clone(&backend), settings),
            translator: Translator::new(options.phrases, options.bot_identity),
            coordinator: RunCoordinator::new(backend, options.poll),
            dispatcher: ResponseDispatcher::new(sender, options.show_debug),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handle one inbound event and return the number of messages sent.
    pub async fn handle(&self, event: ChatEvent) -> Result<usize, BotError> {
        let span = info_span!(
            "event",
            correlation_id = %new_correlation_id(),
            chat_id = %event.chat_id(),
            kind = event.kind(),
        );
        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: ChatEvent) -> Result<usize, BotError> {
        let chat_id = event.chat_id();
        let session = self.registry.get_or_create(chat_id).await?;

        let envelope = self.translator.translate(&event);
        debug!(kind = ?envelope.kind, "translated event");

        let fragments = self.coordinator.submit(&session, &envelope).await?;
        self.dispatcher
            .dispatch(chat_id, &fragments, event.reply_to())
            .await
    }

    /// Start the chat over on a fresh backend thread.
    pub async fn reset(&self, chat_id: ChatId) -> Result<Option<Arc<Session>>, AiError> {
        self.registry.reset(chat_id).await
    }

    /// Forget the chat's session entirely.
    pub async fn forget(&self, chat_id: ChatId) -> Option<Arc<Session>> {
        self.registry.remove(chat_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::testing::{phrase_book, reply, FakeBackend, RecordingSender};
    use crate::{ContentSegment, Role};

    fn options() -> InterlocutorOptions {
        InterlocutorOptions {
            bot_identity: "dovbobot".into(),
            phrases: phrase_book(),
            history_size: 10,
            system_prompt: None,
            poll: PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts: Some(50),
            },
            show_debug: false,
        }
    }

    fn service() -> (Arc<FakeBackend>, Arc<RecordingSender>, Interlocutor) {
        let backend = Arc::new(FakeBackend::new());
        let sender = Arc::new(RecordingSender::default());
        let service = Interlocutor::new(backend.clone(), sender.clone(), options());
        (backend, sender, service)
    }

    #[tokio::test]
    async fn start_command_greets_new_chat() {
        let (backend, sender, service) = service();
        backend.polls_before_done.store(2, Ordering::SeqCst);
        backend.script_reply(&[&[reply("Hello!").as_str()]]);

        let sent = service
            .handle(ChatEvent::PrivateMessage {
                chat_id: ChatId(42),
                text: "/start".into(),
                user_name: "alice".into(),
            })
            .await
            .unwrap();

        assert_eq!(sent, 1);
        assert_eq!(sender.sent(), vec![(ChatId(42), "Hello!".to_string(), None)]);

        let session = service.registry().get(ChatId(42)).await.unwrap();
        let posted = &backend.thread_messages(&session.thread_id())[0];
        let ContentSegment::Text(body) = &posted.content[0] else {
            panic!("expected text segment");
        };
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(value["type"], "prompt");
        assert_eq!(value["content"]["recipient"], "dovbobot");
        assert_eq!(value["content"]["message"], "alice started a chat, say hi");
    }

    #[tokio::test]
    async fn group_message_replies_to_trigger() {
        let (backend, sender, service) = service();
        backend.script_reply(&[&[reply("sure").as_str()]]);

        service
            .handle(ChatEvent::GroupMessage {
                chat_id: ChatId(-100),
                text: "bot, help".into(),
                user_name: "bob".into(),
                group_name: "devs".into(),
                reply_to_message_id: Some(11),
            })
            .await
            .unwrap();

        assert_eq!(sender.sent(), vec![(ChatId(-100), "sure".to_string(), Some(11))]);
    }

    #[tokio::test]
    async fn history_records_exchange() {
        let (backend, _sender, service) = service();
        let answer = reply("pong");
        backend.script_reply(&[&[answer.as_str()]]);

        service
            .handle(ChatEvent::PrivateMessage {
                chat_id: ChatId(1),
                text: " ping ".into(),
                user_name: "carol".into(),
            })
            .await
            .unwrap();

        let history = service.registry().get(ChatId(1)).await.unwrap().get_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "ping");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, answer);
    }

    #[tokio::test]
    async fn backend_failure_sends_nothing() {
        let (backend, sender, service) = service();
        backend.fail_create.store(true, Ordering::SeqCst);

        let err = service
            .handle(ChatEvent::BotAddedToGroup {
                chat_id: ChatId(-5),
                group_name: "devs".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::Backend(AiError::NetworkError(_))));
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn other_chats_unaffected_by_failure() {
        let (backend, sender, service) = service();
        backend.script_reply(&[&[reply("fine").as_str()]]);
        let ok = service
            .handle(ChatEvent::PrivateMessage {
                chat_id: ChatId(1),
                text: "hi".into(),
                user_name: "a".into(),
            })
            .await;
        assert_eq!(ok.unwrap(), 1);

        backend.fail_post.store(true, Ordering::SeqCst);
        let failed = service
            .handle(ChatEvent::PrivateMessage {
                chat_id: ChatId(2),
                text: "hi".into(),
                user_name: "b".into(),
            })
            .await;
        assert!(failed.is_err());

        let session = service.registry().get(ChatId(2)).await.unwrap();
        assert!(!session.has_active_run());
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn reset_and_forget() {
        let (backend, _sender, service) = service();
        backend.script_reply(&[&["{\"type\":\"noop\"}"]]);
        service
            .handle(ChatEvent::PrivateMessage {
                chat_id: ChatId(8),
                text: "hi".into(),
                user_name: "d".into(),
            })
            .await
            .unwrap();

        let session = service.reset(ChatId(8)).await.unwrap().unwrap();
        assert_eq!(session.history_len(), 0);
        assert_eq!(backend.deleted_threads().len(), 1);

        assert!(service.forget(ChatId(8)).await.is_some());
        assert!(service.registry().is_empty().await);
    }
}
