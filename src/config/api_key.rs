// src/config/api_key.rs

use crate::{
    config::ExternalConfig,
    constants,
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{debug, info};
use std::{fs, path::PathBuf};

pub(crate) fn get_config_dir() -> AppResult<PathBuf> {
    let path = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("Could not determine the home directory")))?
        .join(constants::CONFIG_DIR_NAME);
    Ok(path)
}

pub(super) fn get_config_path() -> AppResult<PathBuf> {
    Ok(get_config_dir()?.join(constants::CONFIG_FILE_NAME))
}

pub(crate) fn load_or_create_external_config() -> AppResult<ExternalConfig> {
    let config_path = get_config_path()?;
    if config_path.is_file() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file '{}'", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", config_path.display()))
            .map_err(AppError::from)
    } else {
        info!("Config file {:?} not found, writing defaults", config_path);
        let config = ExternalConfig::default_app_config();

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let json_content = serde_json::to_string_pretty(&config)?;
        fs::write(&config_path, json_content)?;

        Ok(config)
    }
}

pub fn load_api_key_from_config() -> Option<String> {
    load_or_create_external_config()
        .ok()
        .and_then(|config| config.api_key)
}

/// Picks the API key from the command line, then the environment, then the config file.
/// Returns the key together with a description of where it came from.
pub fn resolve_api_key(cli_key: Option<&str>) -> (Option<String>, String) {
    if let Some(key) = cli_key
        && !key.trim().is_empty()
    {
        debug!("Using API key from the command line");
        return (Some(key.trim().to_string()), "command line".to_string());
    }
    if let Ok(key) = std::env::var(constants::API_KEY_ENV)
        && !key.trim().is_empty()
    {
        debug!("Using API key from {}", constants::API_KEY_ENV);
        return (
            Some(key.trim().to_string()),
            format!("environment ({})", constants::API_KEY_ENV),
        );
    }
    if let Some(key) = load_api_key_from_config()
        && !key.trim().is_empty()
    {
        debug!("Using API key from the config file");
        return (Some(key.trim().to_string()), "config file".to_string());
    }
    debug!("No API key found anywhere");
    (None, "nowhere".to_string())
}
