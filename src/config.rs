//! Runtime configuration.
//!
//! Values come from an optional TOML file in the user's config directory and
//! are overridden by environment variables (a `.env` file is loaded first by
//! `main`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

const APP_DIR: &str = "edutask";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Shape of `config.toml`. Every key is optional so the environment can fill
/// the gaps.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub backend_url: String,
    pub api_key: String,
    pub access_token: String,
    pub user_id: String,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Config {
    /// Loads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Config, ConfigError> {
        let file = match default_config_path() {
            Some(path) if path.exists() => Some(read_file(&path)?),
            _ => None,
        };
        Config::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merges a parsed file with an environment lookup. The environment wins.
    pub fn from_sources<F>(file: Option<FileConfig>, env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file.unwrap_or_default();
        let pick = |key: &str, fallback: Option<String>| {
            env(key)
                .filter(|value| !value.trim().is_empty())
                .or(fallback)
        };

        let backend_url = pick("EDUTASK_URL", file.backend_url)
            .ok_or(ConfigError::Missing("EDUTASK_URL"))?
            .trim_end_matches('/')
            .to_string();
        let api_key =
            pick("EDUTASK_API_KEY", file.api_key).ok_or(ConfigError::Missing("EDUTASK_API_KEY"))?;
        let user_id =
            pick("EDUTASK_USER_ID", file.user_id).ok_or(ConfigError::Missing("EDUTASK_USER_ID"))?;
        let access_token =
            pick("EDUTASK_ACCESS_TOKEN", file.access_token).unwrap_or_else(|| api_key.clone());
        let log_level =
            pick("EDUTASK_LOG", file.log_level).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let log_dir = pick("EDUTASK_LOG_DIR", None)
            .map(PathBuf::from)
            .or(file.log_dir)
            .unwrap_or_else(default_log_dir);

        Ok(Config {
            backend_url,
            api_key,
            access_token,
            user_id,
            log_level,
            log_dir,
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Host part of the backend URL, for logging. Falls back to the raw value
/// when it does not parse.
pub fn backend_host(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

pub fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
