//! Assistant backend connection settings.

use serde::{Deserialize, Serialize};

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Id of the pre-configured assistant (persona) runs are started with.
    pub assistant_id: String,
    pub base_url: String,
    /// Per-request HTTP timeout in seconds (valid range: 1-600).
    pub request_timeout_secs: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            assistant_id: String::new(),
            base_url: "https://api.openai.com/v1".into(),
            request_timeout_secs: 60,
        }
    }
}
