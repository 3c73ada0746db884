use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::{
    assets::{get_config_dir, get_default_config},
    mode::Mode,
};

#[derive(Error, Debug)]
pub enum AssistConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Chat endpoint settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub fallback_reply: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_ms: 15_000,
            fallback_reply: "Error connecting to Assist AI".to_string(),
        }
    }
}

impl EndpointConfig {
    /// The `chat_v2` url below `base_url`.
    pub fn chat_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}/chat_v2", self.base_url.trim_end_matches('/')))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Reply reveal pacing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RevealConfig {
    pub cadence_ms: u64,
    pub start_delay_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            cadence_ms: 18,
            start_delay_ms: 300,
        }
    }
}

impl RevealConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

/// Text-to-speech program used to narrate replies.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct NarratorConfig {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: "espeak".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub reveal: RevealConfig,
    pub narrator: NarratorConfig,
    pub mode: Mode,
}

#[derive(Deserialize, Debug, Default)]
struct RawConfig {
    #[serde(default)]
    endpoint: EndpointConfig,
    #[serde(default)]
    reveal: RevealConfig,
    #[serde(default)]
    narrator: NarratorConfig,
    mode: Option<String>,
}

impl RawConfig {
    #[instrument]
    fn to_config(&self) -> Result<Config, AssistConfigError> {
        let chat_url = self.endpoint.chat_url().map_err(|e| {
            AssistConfigError::Config(format!(
                "Invalid endpoint base_url '{}': {e}",
                self.endpoint.base_url
            ))
        })?;
        if !matches!(chat_url.scheme(), "http" | "https") {
            return Err(AssistConfigError::Config(format!(
                "Endpoint base_url must be http or https, got '{}'",
                chat_url.scheme()
            )));
        }

        if self.reveal.cadence_ms == 0 {
            return Err(AssistConfigError::Config(
                "Reveal cadence_ms must be greater than zero".to_string(),
            ));
        }

        let mode = match &self.mode {
            Some(tag) => tag
                .parse::<Mode>()
                .map_err(|e| AssistConfigError::Config(e.to_string()))?,
            None => Mode::default(),
        };

        let command = shellexpand::full(&self.narrator.command)
            .map_err(|e| AssistConfigError::Config(format!("Invalid narrator command: {e}")))?
            .into_owned();

        Ok(Config {
            endpoint: self.endpoint.clone(),
            reveal: self.reveal.clone(),
            narrator: NarratorConfig {
                command,
                ..self.narrator.clone()
            },
            mode,
        })
    }
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), AssistConfigError> {
    let actual_path = config_path.unwrap_or_else(|| get_config_dir().join("assist.yml"));

    let parent_dir = actual_path.parent().ok_or_else(|| {
        AssistConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<Config, AssistConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    let raw: RawConfig = serde_yaml::from_str(&content)?;
    raw.to_config()
}
