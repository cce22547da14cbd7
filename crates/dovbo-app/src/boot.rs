//! Builds the running services from the loaded configuration.

use std::sync::Arc;
use std::time::Duration;

use dovbo_ai::{
    AssistantsConfig, Interlocutor, InterlocutorOptions, OpenAiAssistantsClient, PhraseBook,
    PollPolicy,
};
use dovbo_common::DovboError;
use dovbo_config::{CommonPhrasesConfig, DovboConfig, InterlocutorConfig, OpenAiConfig};
use dovbo_telegram::{Poller, TelegramClient};

pub fn assistants_config(config: &OpenAiConfig) -> AssistantsConfig {
    AssistantsConfig::new(&config.api_key, &config.assistant_id)
        .with_base_url(&config.base_url)
        .with_timeout(Duration::from_secs(u64::from(config.request_timeout_secs)))
}

pub fn phrase_book(phrases: &CommonPhrasesConfig) -> PhraseBook {
    PhraseBook {
        bot_says_hi: phrases.bot_says_hi.clone(),
        bot_joins_chat: phrases.bot_joins_chat.clone(),
        user_joins_chat: phrases.user_joins_chat.clone(),
        user_leaves_chat: phrases.user_leaves_chat.clone(),
        user_invited_to_chat: phrases.user_invited_to_chat.clone(),
        user_kicked_from_chat: phrases.user_kicked_from_chat.clone(),
    }
}

pub fn interlocutor_options(config: &InterlocutorConfig) -> InterlocutorOptions {
    InterlocutorOptions {
        bot_identity: config.bot_identity.clone(),
        phrases: phrase_book(&config.common_phrases),
        history_size: config.history_size as usize,
        system_prompt: config
            .system_prompt
            .clone()
            .filter(|prompt| !prompt.trim().is_empty()),
        poll: PollPolicy {
            interval: Duration::from_millis(u64::from(config.poll_interval_ms)),
            max_attempts: config.max_poll_attempts,
        },
        show_debug: config.show_debug,
    }
}

/// Wire the backend client, the Telegram client and the interlocutor together.
pub fn build(config: &DovboConfig) -> Result<Poller, DovboError> {
    let backend = OpenAiAssistantsClient::new(assistants_config(&config.openai))
        .map_err(|e| DovboError::Assistant(e.to_string()))?;
    let telegram = TelegramClient::new(&config.telegram.token)
        .map_err(|e| DovboError::Telegram(e.to_string()))?;
    let telegram = Arc::new(telegram);

    let interlocutor = Interlocutor::new(
        Arc::new(backend),
        telegram.clone(),
        interlocutor_options(&config.interlocutor),
    );

    Ok(Poller::new(
        telegram,
        Arc::new(interlocutor),
        config.telegram.poll_timeout_secs,
    ))
}
