//! Server configuration.

use anyhow::{bail, Result};
use parley_core::OpenAiConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the assistant API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub assistant: AssistantSettings,
}

/// Which assistant backend answers turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Openai,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantSettings {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub assistant_id: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_instructions")]
    pub instructions: String,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Usually left unset in the file and supplied through `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parley")
        .join("conversations.db")
}

fn default_base_url() -> String {
    OpenAiConfig::default().base_url
}

fn default_model() -> String {
    OpenAiConfig::default().model
}

fn default_temperature() -> f64 {
    OpenAiConfig::default().temperature
}

fn default_instructions() -> String {
    OpenAiConfig::default().instructions
}

fn default_run_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: default_base_url(),
            assistant_id: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            instructions: default_instructions(),
            run_timeout_secs: default_run_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            api_key: None,
        }
    }
}

impl AssistantSettings {
    /// Build the OpenAI client configuration, failing if credentials are missing.
    pub fn openai_config(&self) -> Result<OpenAiConfig> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key.to_string(),
            _ => bail!("{} is not set; add it to the environment or .env", API_KEY_ENV),
        };
        if self.assistant_id.trim().is_empty() {
            bail!("assistant.assistant_id must be set when using the openai provider");
        }

        Ok(OpenAiConfig {
            base_url: self.base_url.clone(),
            api_key,
            assistant_id: self.assistant_id.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            instructions: self.instructions.clone(),
            run_timeout: Duration::from_secs(self.run_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            db_path: default_db_path(),
            assistant: AssistantSettings::default(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.apply_env();
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        // Try to load from config file
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        // Fall back to defaults
        let mut config = Config::default();
        config.apply_env();
        Ok(config)
    }

    /// The environment key wins over the file.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.assistant.api_key = Some(key);
            }
        }
    }
}
