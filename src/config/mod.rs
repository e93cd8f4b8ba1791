//! Configuration (layered: code > env > config file > defaults).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::{ChatError, Result};

pub const DEFAULT_GENERATION_URL: &str = "http://localhost:8080/generate";
pub const DEFAULT_QUERY_PARAM: &str = "prompt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const CONFIG_FILE_NAME: &str = "config.toml";

/// Runtime settings for the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Endpoint receiving `GET ?<query_param>=<prompt>`.
    pub generation_url: String,
    pub query_param: String,
    /// Base URL of the auth service. Auth commands fail without it.
    pub auth_url: Option<String>,
    pub auth_api_key: Option<String>,
    /// Directory holding `config.toml` and persisted state.
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            generation_url: DEFAULT_GENERATION_URL.to_string(),
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            auth_url: None,
            auth_api_key: None,
            data_dir: default_data_dir(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Optional values read from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub generation_url: Option<String>,
    pub query_param: Option<String>,
    pub auth_url: Option<String>,
    pub auth_api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Ignored: the file is looked up inside the data directory, so it
    /// cannot move it. Use `CHATDECK_DATA_DIR`.
    pub data_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Read `path`; a missing file yields empty settings.
    pub fn read(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(toml::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }
}

impl ChatConfig {
    /// Load from the environment (`.env` honoured) and `config.toml`.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Like [`ChatConfig::load`], reading variables through `env`.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = env("CHATDECK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let file = FileConfig::read(&data_dir.join(CONFIG_FILE_NAME))?;
        Self::resolve(data_dir, file, env)
    }

    fn resolve(
        data_dir: PathBuf,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();
        if let Some(ignored) = &file.data_dir {
            warn!(
                data_dir = %ignored.display(),
                "data_dir in config.toml is ignored; set CHATDECK_DATA_DIR instead"
            );
        }
        let timeout_secs = match env("CHATDECK_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ChatError::Configuration(format!("CHATDECK_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            None => file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(ChatError::Configuration(
                "request timeout must be at least one second".to_string(),
            ));
        }

        Ok(Self {
            generation_url: env("CHATDECK_GENERATION_URL")
                .or(file.generation_url)
                .unwrap_or(defaults.generation_url),
            query_param: env("CHATDECK_QUERY_PARAM")
                .or(file.query_param)
                .unwrap_or(defaults.query_param),
            auth_url: env("CHATDECK_AUTH_URL").or(file.auth_url),
            auth_api_key: env("CHATDECK_AUTH_API_KEY").or(file.auth_api_key),
            data_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_generation_url(mut self, url: impl Into<String>) -> Self {
        self.generation_url = url.into();
        self
    }
}

/// `~/.chatdeck`, or `.chatdeck` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".chatdeck"))
        .unwrap_or_else(|| PathBuf::from(".chatdeck"))
}
