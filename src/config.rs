use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const CONFIG_FILE: &str = "config.json";
pub const ENV_DATABASE_URL: &str = "TASKBOARD_DATABASE_URL";
pub const ENV_API_KEY: &str = "TASKBOARD_API_KEY";
pub const ENV_AUTH_URL: &str = "TASKBOARD_AUTH_URL";
pub const ENV_DATA_DIR: &str = "TASKBOARD_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            api_key: String::new(),
            auth_url: default_auth_url(),
            data_dir: default_data_dir(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_auth_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".taskboard")
}

fn default_request_timeout_secs() -> u64 {
    20
}

impl Config {
    /// Reads `config.json` from `dir`. A missing file yields the defaults with
    /// `data_dir` pointing at `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self {
                data_dir: dir.to_path_buf(),
                ..Self::default()
            });
        }
        let mut file = File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    /// Resolves the data directory from the environment, then loads the file there
    /// and applies the remaining environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let dir = lookup(ENV_DATA_DIR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let mut config = Self::load(&dir)?;
        config.apply_overrides(lookup);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = get(ENV_DATABASE_URL) {
            self.database_url = value;
        }
        if let Some(value) = get(ENV_API_KEY) {
            self.api_key = value;
        }
        if let Some(value) = get(ENV_AUTH_URL) {
            self.auth_url = value;
        }
        if let Some(value) = get(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(value);
        }
    }

    /// Required before talking to the network backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing("database_url"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        Ok(())
    }
}
