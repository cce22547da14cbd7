//! dovbobot configuration.
//!
//! TOML-based configuration selected by profile, with an optional secrets
//! overlay file and environment overrides for credentials. All sections use
//! defaults so partial configs work; only the credentials are mandatory.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dovbo_config::{config_to_json, resolve_config, validate};
//!
//! let config = resolve_config("default", None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! validate(&config).expect("invalid config");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use validation::validate;

pub use schema::{
    CommonPhrasesConfig, DovboConfig, InterlocutorConfig, LogFormat, LogLevel, LoggingConfig,
    OpenAiConfig, TelegramConfig,
};

use std::path::Path;

use dovbo_common::ConfigError;

/// Load and overlay the configuration without validating it.
///
/// `path` overrides the profile-based lookup. Environment overrides
/// (`DOVBOBOT_*`) are applied after the files, so a deployment can keep
/// credentials out of the TOML entirely. Call [`validate`] before use.
pub fn resolve_config(profile: &str, path: Option<&Path>) -> Result<DovboConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_profile(profile)?,
    };

    toml_loader::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string with secrets masked.
pub fn config_to_json(config: &DovboConfig) -> String {
    serde_json::to_string_pretty(&config.redacted())
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
