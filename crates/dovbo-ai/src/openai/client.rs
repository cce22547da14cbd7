//! Assistants API client struct, request helpers and error mapping.

use serde::de::DeserializeOwned;

use crate::AiError;

use super::config::AssistantsConfig;

pub(crate) const ASSISTANTS_BETA: &str = "assistants=v2";
/// Page size for message listing (the API maximum).
pub(crate) const LIST_LIMIT: u32 = 100;

/// OpenAI Assistants API client.
pub struct OpenAiAssistantsClient {
    pub(crate) config: AssistantsConfig,
    pub(crate) http: reqwest::Client,
}

impl OpenAiAssistantsClient {
    pub fn new(config: AssistantsConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// Attach auth and beta headers.
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA)
    }

    /// Send a request and decode the JSON body, mapping HTTP failures.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout(e.to_string())
                } else {
                    AiError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))
    }
}

pub(crate) fn api_error(status: reqwest::StatusCode, body: &str) -> AiError {
    let body = body.chars().take(200).collect::<String>();
    AiError::ApiError(format!("HTTP {status}: {body}"))
}
