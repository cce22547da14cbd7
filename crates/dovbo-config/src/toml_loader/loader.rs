//! Core TOML config loading: main file plus optional secrets overlay.

use crate::schema::DovboConfig;
use dovbo_common::ConfigError;
use std::path::Path;
use tracing::{debug, info};

use super::merge::merge_tables;
use super::paths::{create_default_config, profile_config_path, secrets_path_for};

/// Load config from a specific TOML file path.
///
/// If a sibling `.<stem>.secrets.toml` exists it is deep-merged over the main
/// file before deserializing; missing fields fall back to serde defaults.
pub fn load_from_path(path: &Path) -> Result<DovboConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let mut value = read_toml(path)?;

    let secrets = secrets_path_for(path);
    if secrets.exists() {
        let overlay = read_toml(&secrets)?;
        merge_tables(&mut value, overlay);
        debug!("merged secrets from {}", secrets.display());
    }

    let config = value
        .try_into::<DovboConfig>()
        .map_err(|e| ConfigError::ParseError(format!("invalid config in {}: {e}", path.display())))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load the config for a named profile.
///
/// Looks for `etc/<profile>.toml` first, then the platform config directory.
/// When neither exists a documented default file is written to the platform
/// location and defaults are returned.
pub fn load_profile(profile: &str) -> Result<DovboConfig, ConfigError> {
    let local = Path::new("etc").join(format!("{profile}.toml"));
    if local.exists() {
        return load_from_path(&local);
    }

    let path = profile_config_path(profile)?;
    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found for profile '{profile}', creating {}", path.display());
            create_default_config(&path)?;
            Ok(DovboConfig::default())
        }
        Err(e) => Err(e),
    }
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML {}: {e}", path.display())))
}
