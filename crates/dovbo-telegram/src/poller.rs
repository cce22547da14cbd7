//! Long-poll loop feeding Telegram updates to the interlocutor.

use std::sync::Arc;
use std::time::Duration;

use dovbo_ai::Interlocutor;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::client::TelegramClient;
use crate::updates::{to_event, Update};

/// Delay before retrying after a failed `getUpdates`.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct Poller {
    client: Arc<TelegramClient>,
    interlocutor: Arc<Interlocutor>,
    timeout_secs: u32,
    offset: i64,
}

impl Poller {
    pub fn new(
        client: Arc<TelegramClient>,
        interlocutor: Arc<Interlocutor>,
        timeout_secs: u32,
    ) -> Self {
        Self {
            client,
            interlocutor,
            timeout_secs,
            offset: 0,
        }
    }

    /// Poll until `shutdown` is cancelled, handling each event on its own task.
    ///
    /// In-flight events are allowed to finish before this returns.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut tasks = JoinSet::new();
        info!(timeout_secs = self.timeout_secs, "telegram polling started");

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.client.get_updates(self.offset, self.timeout_secs) => polled,
            };

            match polled {
                Ok(batch) => {
                    let (offset, updates) = decode_batch(self.offset, batch);
                    self.offset = offset;
                    for update in &updates {
                        self.spawn_event(&mut tasks, update);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "telegram poll failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }

            while let Some(joined) = tasks.try_join_next() {
                log_join(joined);
            }
        }

        info!(pending = tasks.len(), "telegram polling stopped, draining events");
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
    }

    fn spawn_event(&self, tasks: &mut JoinSet<()>, update: &Update) {
        let event = match to_event(update) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                warn!(update_id = update.update_id, error = %e, "skipping update");
                return;
            }
        };

        let interlocutor = Arc::clone(&self.interlocutor);
        tasks.spawn(async move {
            let chat_id = event.chat_id();
            let kind = event.kind();
            if let Err(e) = interlocutor.handle(event).await {
                error!(%chat_id, kind, error = %e, "failed to handle event");
            }
        });
    }
}

/// Decode a raw `getUpdates` batch.
///
/// Returns the offset that acknowledges every entry carrying an `update_id`,
/// together with the entries that decoded. Undecodable entries are logged and
/// skipped so they are not redelivered.
fn decode_batch(current: i64, batch: Vec<serde_json::Value>) -> (i64, Vec<Update>) {
    let mut offset = current;
    let mut updates = Vec::with_capacity(batch.len());

    for raw in batch {
        let update_id = raw.get("update_id").and_then(serde_json::Value::as_i64);
        if let Some(id) = update_id {
            offset = offset.max(id + 1);
        }
        match serde_json::from_value::<Update>(raw) {
            Ok(update) => updates.push(update),
            Err(e) => warn!(?update_id, error = %e, "skipping undecodable update"),
        }
    }

    (offset, updates)
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "event task panicked");
    }
}
