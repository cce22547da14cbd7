//! Bot API client: `getUpdates` and `sendMessage`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use dovbo_ai::{BotError, ChatSender};
use dovbo_common::ChatId;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::TelegramError;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Update kinds we ask Telegram to deliver.
pub const ALLOWED_UPDATES: [&str; 3] = ["message", "my_chat_member", "chat_member"];

/// Every Bot API response is wrapped in this.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramClient {
    token: String,
    base_url: String,
    http: reqwest::Client,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TelegramError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            token: token.into(),
            base_url: TELEGRAM_API_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<T, TelegramError> {
        let response = self
            .http
            .post(self.api_url(method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TelegramError::Network(e.without_url().to_string()))?;
        parse_response(method, status, &text)
    }

    /// Long-poll for updates with `update_id >= offset`.
    ///
    /// Entries are returned undecoded so one unreadable update cannot fail the batch.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u32,
    ) -> Result<Vec<serde_json::Value>, TelegramError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ALLOWED_UPDATES,
        });
        // Leave the server room to answer before the client gives up.
        let timeout = Duration::from_secs(u64::from(timeout_secs) + 10);
        self.call("getUpdates", body, timeout).await
    }

    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), TelegramError> {
        let body = send_message_body(chat_id, text, reply_to);
        let _: serde_json::Value = self
            .call("sendMessage", body, Duration::from_secs(30))
            .await?;
        debug!(%chat_id, "sent message");
        Ok(())
    }
}

fn send_message_body(chat_id: ChatId, text: &str, reply_to: Option<i64>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "text": text,
        "parse_mode": "HTML",
    });
    if let Some(message_id) = reply_to {
        body["reply_to_message_id"] = serde_json::json!(message_id);
    }
    body
}

fn parse_response<T: DeserializeOwned>(
    method: &str,
    status: reqwest::StatusCode,
    text: &str,
) -> Result<T, TelegramError> {
    let parsed: ApiResponse<T> = serde_json::from_str(text).map_err(|e| {
        if status.is_success() {
            TelegramError::Parse(format!("{method}: {e}"))
        } else {
            let text = text.chars().take(200).collect::<String>();
            TelegramError::Api(format!("{method} HTTP {status}: {text}"))
        }
    })?;

    match parsed {
        ApiResponse {
            ok: true,
            result: Some(result),
            ..
        } => Ok(result),
        ApiResponse { description, .. } => Err(TelegramError::Api(format!(
            "{method} HTTP {status}: {}",
            description.unwrap_or_else(|| "no description".into())
        ))),
    }
}

#[async_trait]
impl ChatSender for TelegramClient {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), BotError> {
        self.send_message(chat_id, text, reply_to)
            .await
            .map_err(|e| BotError::Delivery(e.to_string()))
    }
}
