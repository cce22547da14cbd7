//! `DOVBOBOT_*` environment overrides.

use crate::schema::{DovboConfig, LogLevel};
use tracing::warn;

pub(crate) const ENV_OPENAI_API_KEY: &str = "DOVBOBOT_OPENAI_API_KEY";
pub(crate) const ENV_ASSISTANT_ID: &str = "DOVBOBOT_ASSISTANT_ID";
pub(crate) const ENV_TELEGRAM_TOKEN: &str = "DOVBOBOT_TELEGRAM_TOKEN";
pub(crate) const ENV_LOG_LEVEL: &str = "DOVBOBOT_LOG_LEVEL";

/// Apply environment overrides on top of a loaded config.
///
/// `lookup` is normally `std::env::var(..).ok()`; empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut DovboConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = get(ENV_OPENAI_API_KEY) {
        config.openai.api_key = key;
    }
    if let Some(id) = get(ENV_ASSISTANT_ID) {
        config.openai.assistant_id = id;
    }
    if let Some(token) = get(ENV_TELEGRAM_TOKEN) {
        config.telegram.token = token;
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        match parse_level(&level) {
            Some(level) => config.logging.level = level,
            None => warn!("ignoring unknown {ENV_LOG_LEVEL} value '{level}'"),
        }
    }
}

fn parse_level(value: &str) -> Option<LogLevel> {
    match value.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => Some(LogLevel::Debug),
        "INFO" => Some(LogLevel::Info),
        "WARN" | "WARNING" => Some(LogLevel::Warning),
        "ERROR" => Some(LogLevel::Error),
        _ => None,
    }
}
