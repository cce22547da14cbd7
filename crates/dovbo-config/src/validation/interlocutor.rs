//! Validation for the interlocutor section and its phrase templates.

use std::sync::OnceLock;

use regex::Regex;

use crate::schema::DovboConfig;

use super::helpers::{validate_range, validate_required};

/// Placeholders each situational template may reference.
pub fn allowed_placeholders(phrase: &str) -> &'static [&'static str] {
    match phrase {
        "bot_says_hi" | "user_joins_chat" | "user_leaves_chat" => &["user_name"],
        "bot_joins_chat" => &["group_name"],
        "user_invited_to_chat" => &["user_name", "inviter_name"],
        "user_kicked_from_chat" => &["user_name", "kicker_name"],
        _ => &[],
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]*)\}").expect("placeholder regex is valid"))
}

pub(crate) fn validate_interlocutor(errors: &mut Vec<String>, config: &DovboConfig) {
    let cfg = &config.interlocutor;
    validate_required(errors, "interlocutor.bot_identity", &cfg.bot_identity);
    validate_range(errors, "interlocutor.history_size", cfg.history_size, 1, 10_000);
    validate_range(
        errors,
        "interlocutor.poll_interval_ms",
        cfg.poll_interval_ms,
        50,
        60_000,
    );
    if cfg.max_poll_attempts == Some(0) {
        errors.push("interlocutor.max_poll_attempts must be at least 1 when set".into());
    }
}

pub(crate) fn validate_phrases(errors: &mut Vec<String>, config: &DovboConfig) {
    let phrases = &config.interlocutor.common_phrases;
    let templates = [
        ("bot_says_hi", &phrases.bot_says_hi),
        ("bot_joins_chat", &phrases.bot_joins_chat),
        ("user_joins_chat", &phrases.user_joins_chat),
        ("user_leaves_chat", &phrases.user_leaves_chat),
        ("user_invited_to_chat", &phrases.user_invited_to_chat),
        ("user_kicked_from_chat", &phrases.user_kicked_from_chat),
    ];

    for (name, template) in templates {
        let key = format!("interlocutor.common_phrases.{name}");
        validate_required(errors, &key, template);

        let allowed = allowed_placeholders(name);
        for capture in placeholder_regex().captures_iter(template) {
            let placeholder = &capture[1];
            if !allowed.contains(&placeholder) {
                errors.push(format!(
                    "{key} uses unknown placeholder {{{placeholder}}} (allowed: {})",
                    allowed.join(", ")
                ));
            }
        }
    }
}
