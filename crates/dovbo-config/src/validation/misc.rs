//! Validation for credentials and the transport/backend sections.

use crate::schema::DovboConfig;

use super::helpers::{validate_range, validate_required};

/// Credentials have no sensible default.
pub(crate) fn validate_credentials(errors: &mut Vec<String>, config: &DovboConfig) {
    validate_required(errors, "openai.api_key", &config.openai.api_key);
    validate_required(errors, "openai.assistant_id", &config.openai.assistant_id);
    validate_required(errors, "telegram.token", &config.telegram.token);
}

pub(crate) fn validate_openai(errors: &mut Vec<String>, config: &DovboConfig) {
    validate_range(
        errors,
        "openai.request_timeout_secs",
        config.openai.request_timeout_secs,
        1,
        600,
    );
    let url = config.openai.base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!("openai.base_url = '{url}' is not an http(s) URL"));
    }
}

pub(crate) fn validate_telegram(errors: &mut Vec<String>, config: &DovboConfig) {
    validate_range(
        errors,
        "telegram.poll_timeout_secs",
        config.telegram.poll_timeout_secs,
        0,
        50,
    );
}
