use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_BASE_URL: &str = "https://polisen.se/";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_USER_AGENT: &str = "polisen-feed/0.1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the config file from the data directory, falling back to
    /// defaults when it is missing or unreadable.
    pub fn load() -> Self {
        let path = config_path();
        match read_config(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), "ignoring config file: {err:#}");
                Self::default()
            }
        }
    }

    /// Base URL with a trailing slash so relative paths join beneath it.
    pub fn base(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("invalid base url {raw}"))
    }
}

pub fn config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
        .join("polisen-feed")
        .join("config.json")
}

pub fn read_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("unable to parse config {}", path.display()))
}
