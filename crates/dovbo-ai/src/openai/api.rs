//! AssistantBackend implementation for OpenAiAssistantsClient.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{AiError, AssistantBackend, BackendMessage, Role, RunHandle, RunStatus};

use super::client::{OpenAiAssistantsClient, LIST_LIMIT};
use super::types::{
    CreateMessage, CreateRun, DeletedObject, ListPage, MessageObject, RunObject, ThreadObject,
};

#[async_trait]
impl AssistantBackend for OpenAiAssistantsClient {
    async fn create_thread(&self) -> Result<String, AiError> {
        let request = self
            .http
            .post(self.url("threads"))
            .json(&serde_json::json!({}));
        let thread: ThreadObject = self.send(request).await?;
        debug!(thread_id = %thread.id, "created thread");
        Ok(thread.id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), AiError> {
        let request = self.http.delete(self.url(&format!("threads/{thread_id}")));
        let deleted: DeletedObject = self.send(request).await?;
        if !deleted.deleted {
            warn!(%thread_id, "thread deletion not acknowledged");
        }
        Ok(())
    }

    async fn post_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<String, AiError> {
        let request = self
            .http
            .post(self.url(&format!("threads/{thread_id}/messages")))
            .json(&CreateMessage {
                role: role.as_str(),
                content,
            });
        let message: MessageObject = self.send(request).await?;
        Ok(message.id)
    }

    async fn start_run(&self, thread_id: &str) -> Result<RunHandle, AiError> {
        let request = self
            .http
            .post(self.url(&format!("threads/{thread_id}/runs")))
            .json(&CreateRun {
                assistant_id: &self.config.assistant_id,
            });
        let run: RunObject = self.send(request).await?;
        debug!(%thread_id, run_id = %run.id, status = ?run.status, "started run");
        Ok(RunHandle {
            id: run.id,
            thread_id: run.thread_id,
            status: run.status,
        })
    }

    async fn get_run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AiError> {
        let request = self
            .http
            .get(self.url(&format!("threads/{thread_id}/runs/{run_id}")));
        let run: RunObject = self.send(request).await?;
        Ok(run.status)
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AiError> {
        let request = self
            .http
            .post(self.url(&format!("threads/{thread_id}/runs/{run_id}/cancel")));
        let run: RunObject = self.send(request).await?;
        debug!(%thread_id, %run_id, status = ?run.status, "cancelled run");
        Ok(run.status)
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        after: Option<&str>,
    ) -> Result<Vec<BackendMessage>, AiError> {
        let url = self.url(&format!("threads/{thread_id}/messages"));
        let mut cursor = after.map(str::to_string);
        let mut messages = Vec::new();

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("order", "asc")])
                .query(&[("limit", LIST_LIMIT)]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("after", cursor)]);
            }
            let page: ListPage<MessageObject> = self.send(request).await?;

            messages.extend(page.data.into_iter().map(BackendMessage::from));
            match page.last_id {
                Some(last) if page.has_more => cursor = Some(last),
                _ => break,
            }
        }

        debug!(%thread_id, count = messages.len(), "listed messages");
        Ok(messages)
    }
}
