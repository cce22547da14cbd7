//! Default config file content.

/// Documented TOML written when no config exists yet.
pub(crate) fn default_config_toml() -> &'static str {
    r#"# dovbobot configuration
#
# Credentials can be kept out of this file: put them in a sibling
# `.<profile>.secrets.toml`, or set DOVBOBOT_OPENAI_API_KEY,
# DOVBOBOT_ASSISTANT_ID and DOVBOBOT_TELEGRAM_TOKEN.

[openai]
api_key = ""
assistant_id = ""
base_url = "https://api.openai.com/v1"
request_timeout_secs = 60

[telegram]
token = ""
poll_timeout_secs = 30

[interlocutor]
bot_identity = "dovbobot"
history_size = 100
poll_interval_ms = 500
# max_poll_attempts = 240
# system_prompt = "You are a friendly chat member."
show_debug = false

# Placeholders: {user_name}, {group_name}, {inviter_name}, {kicker_name}
[interlocutor.common_phrases]
bot_says_hi = "{user_name} has just started a private chat with you. Say hi."
bot_joins_chat = "You have been added to the group {group_name}. Introduce yourself."
user_joins_chat = "{user_name} has joined the chat. Greet them."
user_leaves_chat = "{user_name} has left the chat."
user_invited_to_chat = "{inviter_name} has invited {user_name} to the chat. Greet them."
user_kicked_from_chat = "{kicker_name} has removed {user_name} from the chat."

[logging]
# DEBUG, INFO, WARNING or ERROR
level = "INFO"
# pretty or json
format = "pretty"
"#
}
