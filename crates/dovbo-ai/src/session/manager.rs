//! Session struct: history, thread binding and the run gate.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use dovbo_common::ChatId;
use tokio::sync::Notify;
use tracing::debug;

use crate::{Message, Role, RunHandle, RunStatus};

use super::history::History;
use super::types::RunGuard;

/// Conversation state for one chat.
///
/// Shared between event tasks behind an `Arc`; all mutation goes through
/// short synchronous locks that are never held across an `.await`.
pub struct Session {
    chat_id: ChatId,
    /// Backend thread the chat is bound to; replaced on reset.
    thread_id: RwLock<String>,
    history: Mutex<History>,
    /// Run currently in flight on the thread, if any.
    active_run: Mutex<Option<RunHandle>>,
    /// Run gate: true from reservation until the guard drops.
    pub(super) busy: AtomicBool,
    pub(super) idle: Notify,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("chat_id", &self.chat_id)
            .field("thread_id", &self.thread_id())
            .field("history_len", &self.history_len())
            .field("busy", &self.has_active_run())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new(chat_id: ChatId, thread_id: impl Into<String>, history_size: usize) -> Self {
        Self {
            chat_id,
            thread_id: RwLock::new(thread_id.into()),
            history: Mutex::new(History::new(history_size)),
            active_run: Mutex::new(None),
            busy: AtomicBool::new(false),
            idle: Notify::new(),
        }
    }

    pub fn with_system_prompt(self, prompt: impl Into<String>) -> Self {
        self.add_system_pinned(prompt);
        self
    }

    /// Set the system message that always leads the history. Replaces any
    /// previous one and never counts against capacity.
    pub fn add_system_pinned(&self, content: impl Into<String>) {
        lock(&self.history).pin_system(content);
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn thread_id(&self) -> String {
        self.thread_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_thread_id(&self, thread_id: impl Into<String>) {
        *self
            .thread_id
            .write()
            .unwrap_or_else(PoisonError::into_inner) = thread_id.into();
    }

    pub fn add_user(&self, content: impl Into<String>) {
        lock(&self.history).push(Message::new(Role::User, content));
    }

    pub fn add_assistant(&self, content: impl Into<String>) {
        lock(&self.history).push(Message::new(Role::Assistant, content));
    }

    /// History snapshot, pinned system message first.
    pub fn get_history(&self) -> Vec<Message> {
        lock(&self.history).snapshot()
    }

    pub fn history_len(&self) -> usize {
        lock(&self.history).len()
    }

    pub fn clear_history(&self) {
        lock(&self.history).clear();
    }

    /// True while the gate is held (RUN_PENDING).
    pub fn has_active_run(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn active_run(&self) -> Option<RunHandle> {
        lock(&self.active_run).clone()
    }

    pub fn set_active_run(&self, run: RunHandle) {
        *lock(&self.active_run) = Some(run);
    }

    pub(crate) fn update_active_run_status(&self, status: RunStatus) {
        if let Some(run) = lock(&self.active_run).as_mut() {
            run.status = status;
        }
    }

    pub fn clear_active_run(&self) {
        lock(&self.active_run).take();
    }

    /// Take the run gate if it is free.
    pub fn try_acquire_run(&self) -> Option<RunGuard<'_>> {
        RunGuard::acquire(self)
    }

    /// Wait for the run gate.
    ///
    /// Woken as soon as the current holder releases; `recheck` bounds each
    /// wait so the gate is re-examined at a fixed interval regardless.
    pub async fn acquire_run(&self, recheck: Duration) -> RunGuard<'_> {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(guard) = self.try_acquire_run() {
                return guard;
            }

            debug!(chat_id = %self.chat_id, "waiting for the previous run to finish");
            let _ = tokio::time::timeout(recheck, notified).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn session() -> Session {
        Session::new(ChatId(42), "thread_1", 3)
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let s = session();
        assert_eq!(s.chat_id(), ChatId(42));
        assert_eq!(s.thread_id(), "thread_1");
        assert!(!s.has_active_run());
        assert!(s.active_run().is_none());
        assert!(s.get_history().is_empty());
    }

    #[test]
    fn history_is_bounded_and_system_prompt_pinned() {
        let s = session().with_system_prompt("You are dovbo.");
        for n in 0..5 {
            s.add_user(format!("q{n}"));
            s.add_assistant(format!("a{n}"));
        }
        let history = s.get_history();
        assert_eq!(s.history_len(), 3);
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[1].content, "a3");
        assert_eq!(history[3].content, "a4");
    }

    #[test]
    fn guard_round_trip_clears_marker() {
        let s = session();
        {
            let _guard = s.try_acquire_run().expect("gate is free");
            s.set_active_run(RunHandle {
                id: "run_1".into(),
                thread_id: "thread_1".into(),
                status: RunStatus::Queued,
            });
            assert!(s.has_active_run());
            assert!(s.try_acquire_run().is_none());

            s.update_active_run_status(RunStatus::InProgress);
            assert_eq!(s.active_run().unwrap().status, RunStatus::InProgress);
        }
        assert!(!s.has_active_run());
        assert!(s.active_run().is_none());
        assert!(s.try_acquire_run().is_some());
    }

    #[test]
    fn pinned_system_message_replaced_not_duplicated() {
        let session = session();
        session.add_system_pinned("first");
        session.add_system_pinned("second");
        session.add_user("hi");

        let history = session.get_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].content, "second");
    }

    #[test]
    fn debug_shows_binding_and_gate() {
        let s = session();
        s.add_user("hi");
        let shown = format!("{s:?}");
        assert!(shown.contains("thread_1"));
        assert!(shown.contains("history_len: 1"));
        assert!(shown.contains("busy: false"));
    }

    #[test]
    fn reset_thread_binding() {
        let s = session();
        s.set_thread_id("thread_2");
        assert_eq!(s.thread_id(), "thread_2");
    }

    #[tokio::test]
    async fn waiter_wakes_when_gate_released() {
        let s = Arc::new(session());
        let guard = s.try_acquire_run().unwrap();

        let waiter = {
            let s = Arc::clone(&s);
            tokio::spawn(async move {
                // Long recheck: only the notification can wake this in time.
                let _guard = s.acquire_run(Duration::from_secs(30)).await;
                s.chat_id()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);

        let woke = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter should wake on release")
            .unwrap();
        assert_eq!(woke, ChatId(42));
        assert!(!s.has_active_run());
    }
}
