//! Scripted in-memory backend and recording sender for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dovbo_common::ChatId;

use crate::dispatcher::ChatSender;
use crate::translator::PhraseBook;
use crate::{
    AiError, AssistantBackend, BackendMessage, BotError, ContentSegment, Role, RunHandle,
    RunStatus,
};

struct FakeRun {
    thread_id: String,
    polls_left: u32,
    final_status: RunStatus,
    replies: Vec<Vec<ContentSegment>>,
    cancelling: bool,
}

#[derive(Default)]
struct State {
    threads: HashMap<String, Vec<BackendMessage>>,
    runs: HashMap<String, FakeRun>,
    scripted: VecDeque<Vec<Vec<ContentSegment>>>,
    deleted: Vec<String>,
    /// Runs currently pending, per thread.
    in_flight: HashMap<String, usize>,
}

/// Backend whose runs complete after `polls_before_done` status checks and
/// append the next scripted batch of assistant messages.
#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<State>,
    next_id: AtomicUsize,
    pub polls_before_done: AtomicUsize,
    pub threads_created: AtomicUsize,
    pub posts: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_post: AtomicBool,
    pub fail_delete: AtomicBool,
    pub cancels: AtomicUsize,
    /// Status checks that report `cancelling` after a cancel request.
    pub cancelling_polls: AtomicUsize,
    pub final_status: Mutex<Option<RunStatus>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Queue the assistant output of the next run: one inner list per
    /// assistant message, each string a text segment.
    pub fn script_reply(&self, messages: &[&[&str]]) {
        let batch = messages
            .iter()
            .map(|segments| {
                segments
                    .iter()
                    .map(|s| ContentSegment::Text(s.to_string()))
                    .collect()
            })
            .collect();
        self.script_segments(batch);
    }

    pub fn script_segments(&self, batch: Vec<Vec<ContentSegment>>) {
        self.state.lock().unwrap().scripted.push_back(batch);
    }

    /// Put a message on a thread directly, bypassing the run machinery.
    pub fn seed_message(&self, thread_id: &str, role: Role, segments: Vec<ContentSegment>) -> String {
        let id = self.id("msg");
        self.state
            .lock()
            .unwrap()
            .threads
            .entry(thread_id.to_string())
            .or_default()
            .push(BackendMessage {
                id: id.clone(),
                role,
                content: segments,
            });
        id
    }

    pub fn thread_messages(&self, thread_id: &str) -> Vec<BackendMessage> {
        self.state
            .lock()
            .unwrap()
            .threads
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn deleted_threads(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }
}

#[async_trait]
impl AssistantBackend for FakeBackend {
    async fn create_thread(&self) -> Result<String, AiError> {
        // Yield so concurrent first-access tests actually interleave.
        tokio::task::yield_now().await;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AiError::NetworkError("connection refused".into()));
        }
        let id = self.id("thread");
        self.state
            .lock()
            .unwrap()
            .threads
            .insert(id.clone(), Vec::new());
        self.threads_created.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), AiError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AiError::ApiError("HTTP 500: boom".into()));
        }
        let mut state = self.state.lock().unwrap();
        state.threads.remove(thread_id);
        state.deleted.push(thread_id.to_string());
        Ok(())
    }

    async fn post_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, AiError> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(AiError::NetworkError("connection reset".into()));
        }
        self.posts.fetch_add(1, Ordering::SeqCst);
        Ok(self.seed_message(thread_id, role, vec![ContentSegment::Text(content.to_string())]))
    }

    async fn start_run(&self, thread_id: &str) -> Result<RunHandle, AiError> {
        let id = self.id("run");
        let polls_left = self.polls_before_done.load(Ordering::SeqCst) as u32;
        let final_status = self
            .final_status
            .lock()
            .unwrap()
            .unwrap_or(RunStatus::Completed);

        let mut state = self.state.lock().unwrap();
        let replies = state.scripted.pop_front().unwrap_or_default();
        state.runs.insert(
            id.clone(),
            FakeRun {
                thread_id: thread_id.to_string(),
                polls_left,
                final_status,
                replies,
                cancelling: false,
            },
        );
        let in_flight = state.in_flight.entry(thread_id.to_string()).or_default();
        *in_flight += 1;
        self.max_in_flight.fetch_max(*in_flight, Ordering::SeqCst);

        Ok(RunHandle {
            id,
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
        })
    }

    async fn get_run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AiError> {
        let mut state = self.state.lock().unwrap();
        let run = state
            .runs
            .get_mut(run_id)
            .filter(|run| run.thread_id == thread_id)
            .ok_or_else(|| AiError::ApiError(format!("HTTP 404: no run {run_id}")))?;

        if run.polls_left > 0 {
            run.polls_left -= 1;
            return Ok(if run.cancelling {
                RunStatus::Cancelling
            } else {
                RunStatus::InProgress
            });
        }

        let status = run.final_status;
        if !status.is_terminal() {
            return Ok(status);
        }
        let replies = std::mem::take(&mut run.replies);
        state.runs.remove(run_id);
        if let Some(count) = state.in_flight.get_mut(thread_id) {
            *count = count.saturating_sub(1);
        }
        for segments in replies {
            let id = self.id("msg");
            state
                .threads
                .entry(thread_id.to_string())
                .or_default()
                .push(BackendMessage {
                    id,
                    role: Role::Assistant,
                    content: segments,
                });
        }
        Ok(status)
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AiError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        let cancelling_polls = self.cancelling_polls.load(Ordering::SeqCst) as u32;
        let mut state = self.state.lock().unwrap();
        let run = state
            .runs
            .get_mut(run_id)
            .filter(|run| run.thread_id == thread_id)
            .ok_or_else(|| AiError::ApiError(format!("HTTP 400: run {run_id} already ended")))?;
        run.cancelling = true;
        run.polls_left = cancelling_polls;
        run.final_status = RunStatus::Cancelled;
        run.replies.clear();
        Ok(RunStatus::Cancelling)
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        after: Option<&str>,
    ) -> Result<Vec<BackendMessage>, AiError> {
        let messages = self.thread_messages(thread_id);
        let start = match after {
            Some(after) => messages
                .iter()
                .position(|m| m.id == after)
                .map(|i| i + 1)
                .unwrap_or(messages.len()),
            None => 0,
        };
        Ok(messages[start..].to_vec())
    }
}

/// Sender that records every outbound message.
#[derive(Default)]
pub(crate) struct RecordingSender {
    pub sent: Mutex<Vec<(ChatId, String, Option<i64>)>>,
    pub fail: AtomicBool,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<(ChatId, String, Option<i64>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSender for RecordingSender {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), BotError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BotError::Delivery("chat not found".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id, text.to_string(), reply_to));
        Ok(())
    }
}

/// Envelope-shaped reply as the assistant would produce it.
pub(crate) fn reply(text: &str) -> String {
    serde_json::json!({"type": "message", "content": {"message": text}}).to_string()
}

pub(crate) fn phrase_book() -> PhraseBook {
    PhraseBook {
        bot_says_hi: "{user_name} started a chat, say hi".into(),
        bot_joins_chat: "you were added to {group_name}".into(),
        user_joins_chat: "{user_name} joined".into(),
        user_leaves_chat: "{user_name} left".into(),
        user_invited_to_chat: "{inviter_name} invited {user_name}".into(),
        user_kicked_from_chat: "{kicker_name} kicked {user_name}".into(),
    }
}
