use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DovboError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("assistant error: {0}")]
    Assistant(String),

    #[error("telegram error: {0}")]
    Telegram(String),
}
