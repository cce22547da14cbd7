//! Run coordinator: one backend job at a time per session.
//!
//! Submission protocol: take the session's run gate, post the envelope on
//! the session's thread, start a run, poll it until it leaves
//! queued/in-progress, then collect the text of every assistant message
//! created after the posted one. The coordinator is also the only place that
//! appends to session history.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::envelope::PromptEnvelope;
use crate::session::Session;
use crate::{AiError, AssistantBackend, Role, RunHandle, RunStatus};

/// Status checks spent waiting for a cancelled run to settle.
const CANCEL_POLL_LIMIT: u32 = 20;

/// How run completion is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks, also the gate re-check interval.
    pub interval: Duration,
    /// Give up after this many status checks; `None` waits indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: None,
        }
    }
}

pub struct RunCoordinator {
    backend: Arc<dyn AssistantBackend>,
    policy: PollPolicy,
}

impl RunCoordinator {
    pub fn new(backend: Arc<dyn AssistantBackend>, policy: PollPolicy) -> Self {
        Self { backend, policy }
    }

    /// Submit an envelope and return the assistant's text fragments in order.
    ///
    /// An empty result means the assistant chose not to answer. Transport
    /// errors are returned as-is; the session gate is released either way.
    pub async fn submit(
        &self,
        session: &Session,
        envelope: &PromptEnvelope,
    ) -> Result<Vec<String>, AiError> {
        let payload = envelope
            .to_json()
            .map_err(|e| AiError::ParseError(format!("failed to encode envelope: {e}")))?;

        let _guard = session.acquire_run(self.policy.interval).await;
        let thread_id = session.thread_id();
        debug!(chat_id = %session.chat_id(), %thread_id, prompt = %payload, "submitting");

        let request_id = self
            .backend
            .post_message(&thread_id, Role::User, &payload)
            .await?;
        session.add_user(envelope.content.message.as_str());

        let run = self.backend.start_run(&thread_id).await?;
        session.set_active_run(run.clone());

        let status = match self.wait_for_run(session, &run).await {
            Ok(status) => status,
            Err(e @ AiError::Timeout(_)) => {
                self.cancel_and_settle(session, &run).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        if status == RunStatus::RequiresAction {
            // No tools are registered, so the run can never proceed.
            self.cancel_and_settle(session, &run).await;
        }
        if status != RunStatus::Completed {
            warn!(chat_id = %session.chat_id(), run_id = %run.id, ?status, "run ended without completing");
        }

        let messages = self
            .backend
            .list_messages(&thread_id, Some(&request_id))
            .await?;

        let fragments: Vec<String> = messages
            .iter()
            .filter(|message| message.role == Role::Assistant)
            .flat_map(|message| message.text_segments())
            .map(str::to_string)
            .collect();

        for fragment in &fragments {
            session.add_assistant(fragment.as_str());
        }

        info!(
            chat_id = %session.chat_id(),
            run_id = %run.id,
            fragments = fragments.len(),
            "run finished"
        );
        Ok(fragments)
    }

    /// Cancel a run and wait for the backend to let go of the thread, so the
    /// gate is not released while the run is still live.
    async fn cancel_and_settle(&self, session: &Session, run: &RunHandle) {
        if let Err(e) = self.backend.cancel_run(&run.thread_id, &run.id).await {
            warn!(run_id = %run.id, error = %e, "failed to cancel run");
        }

        for _ in 0..CANCEL_POLL_LIMIT {
            match self.backend.get_run_status(&run.thread_id, &run.id).await {
                Ok(status) => {
                    session.update_active_run_status(status);
                    if status.is_terminal() {
                        debug!(run_id = %run.id, ?status, "run settled after cancel");
                        return;
                    }
                }
                Err(e) => {
                    warn!(run_id = %run.id, error = %e, "failed to check cancelled run");
                    return;
                }
            }
            tokio::time::sleep(self.policy.interval).await;
        }
        warn!(run_id = %run.id, "run still not settled after cancel");
    }

    /// Poll until the run leaves queued/in-progress.
    async fn wait_for_run(&self, session: &Session, run: &RunHandle) -> Result<RunStatus, AiError> {
        let mut status = run.status;
        let mut attempts: u32 = 0;

        while status.is_pending() {
            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(AiError::Timeout(format!(
                        "run {} still {status:?} after {attempts} polls",
                        run.id
                    )));
                }
            }

            tokio::time::sleep(self.policy.interval).await;
            status = self
                .backend
                .get_run_status(&run.thread_id, &run.id)
                .await?;
            attempts += 1;
            session.update_active_run_status(status);
            debug!(run_id = %run.id, ?status, attempts, "run status");
        }

        Ok(status)
    }
}
