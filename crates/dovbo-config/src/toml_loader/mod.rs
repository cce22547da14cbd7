//! TOML config file loading, overlaying and creation.

mod env;
mod loader;
mod merge;
mod paths;
mod template;


pub use env::apply_env_overrides;
pub use loader::{load_from_path, load_profile};
pub use paths::{create_default_config, profile_config_path, secrets_path_for};
