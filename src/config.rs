use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::ReasoningMode;
use crate::util::parse_bool_flag;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8765";
const DEFAULT_STREAM_IDLE_TIMEOUT_SECS: u64 = 120;
const KEYS_FILE_NAME: &str = "api_keys.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub mode: ReasoningMode,
    pub include_thinking: bool,
    pub keys_path: PathBuf,
    /// Longest wait for the next body chunk before the stream counts as
    /// stalled. `None` waits forever.
    pub stream_idle_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            mode: ReasoningMode::Auto,
            include_thinking: true,
            keys_path: default_keys_path(),
            stream_idle_timeout: Some(Duration::from_secs(DEFAULT_STREAM_IDLE_TIMEOUT_SECS)),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let api_url = std::env::var("SIGMA_API_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);
        let mode = match std::env::var("SIGMA_MODE") {
            Ok(value) => value
                .parse::<ReasoningMode>()
                .map_err(anyhow::Error::msg)
                .context("invalid SIGMA_MODE")?,
            Err(_) => defaults.mode,
        };
        let include_thinking = std::env::var("SIGMA_INCLUDE_THINKING")
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(defaults.include_thinking);
        let keys_path = std::env::var("SIGMA_KEYS_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.keys_path);
        let stream_idle_timeout = match std::env::var("SIGMA_STREAM_IDLE_TIMEOUT_SECS") {
            Ok(value) => parse_idle_timeout(&value)?,
            Err(_) => defaults.stream_idle_timeout,
        };

        Ok(Self {
            api_url,
            mode,
            include_thinking,
            keys_path,
            stream_idle_timeout,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid SIGMA_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }
        if reqwest::Url::parse(&self.api_url).is_err() {
            bail!("Invalid SIGMA_API_URL '{}': not a valid URL", self.api_url);
        }
        Ok(())
    }
}

fn parse_idle_timeout(value: &str) -> Result<Option<Duration>> {
    let seconds = value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("invalid SIGMA_STREAM_IDLE_TIMEOUT_SECS '{value}'"))?;
    Ok((seconds > 0).then(|| Duration::from_secs(seconds)))
}

fn default_keys_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sigma-chat")
        .join(KEYS_FILE_NAME)
}
