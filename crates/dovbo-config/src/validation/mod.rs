//! Full configuration validation.
//!
//! Each domain has its own submodule; this orchestrator calls them all and
//! collects errors into a single `ConfigError`.

mod helpers;
mod interlocutor;
mod misc;


pub use interlocutor::allowed_placeholders;

use crate::schema::DovboConfig;
use dovbo_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &DovboConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    misc::validate_credentials(&mut errors, config);
    misc::validate_openai(&mut errors, config);
    misc::validate_telegram(&mut errors, config);
    interlocutor::validate_interlocutor(&mut errors, config);
    interlocutor::validate_phrases(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
