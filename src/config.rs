//! Credentials and endpoint configuration.
//!
//! The configuration lives in `~/.config/ai-commit/ai-commit.toml`:
//!
//! ```toml
//! [settings]
//! key = "..."
//! url = "https://my-resource.openai.azure.com"
//! provider = "azure"   # optional: azure | openai | ollama
//! model = "gpt-4o"     # optional
//! ```
//!
//! Environment variables override the file field by field.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::llm::ai::ollama::DEFAULT_OLLAMA_URL;
use crate::utils::prompt::Prompter;
use crate::utils::settings::EnvSource;

/// Default model for hosted providers.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default model for a local Ollama server.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Default endpoint for the OpenAI API.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

const KEY_VARS: &[&str] = &["AI_COMMIT_KEY", "AZURE_OPENAI_API_KEY", "OPENAI_API_KEY"];
const URL_VARS: &[&str] = &["AI_COMMIT_URL", "AZURE_OPENAI_ENDPOINT"];
const PROVIDER_VAR: &str = "AI_COMMIT_PROVIDER";
const MODEL_VAR: &str = "AI_COMMIT_MODEL";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required field is empty after loading.
    #[error("Configuration field `{field}` is empty in {path}; run with --config to set it")]
    Incomplete {
        /// Name of the missing field.
        field: &'static str,
        /// Configuration file consulted.
        path: PathBuf,
    },

    /// Provider name not recognised.
    #[error("Unknown provider {0:?}; expected azure, openai or ollama")]
    UnknownProvider(String),

    /// The file exists but is not valid TOML for this layout.
    #[error("Failed to parse configuration file {path}: {message}")]
    Parse {
        /// Configuration file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// No home directory to place the configuration under.
    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

/// Completion backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Azure OpenAI deployment.
    #[default]
    Azure,
    /// OpenAI API or a compatible server.
    OpenAi,
    /// Local Ollama server.
    Ollama,
}

impl Provider {
    /// All providers, in prompt order.
    pub const ALL: [Self; 3] = [Self::Azure, Self::OpenAi, Self::Ollama];

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Ollama => DEFAULT_OLLAMA_MODEL,
            Self::Azure | Self::OpenAi => DEFAULT_MODEL,
        }
    }

    /// Endpoint used when the URL is left blank, if the provider has one.
    pub fn default_url(self) -> Option<&'static str> {
        match self {
            Self::Azure => None,
            Self::OpenAi => Some(DEFAULT_OPENAI_URL),
            Self::Ollama => Some(DEFAULT_OLLAMA_URL),
        }
    }

    /// Whether an API key is required.
    pub fn requires_key(self) -> bool {
        self != Self::Ollama
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// The `[settings]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// API key.
    #[serde(default)]
    pub key: String,
    /// Endpoint base URL.
    #[serde(default)]
    pub url: String,
    /// Backend, `azure` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    /// Model name, provider default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Settings {
    /// Effective provider.
    pub fn provider(&self) -> Provider {
        self.provider.unwrap_or_default()
    }

    /// Effective model.
    pub fn model(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider().default_model().to_string())
    }

    /// The key with everything but the last four characters hidden.
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        if chars.is_empty() {
            return "(not set)".to_string();
        }
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{visible}", "*".repeat(chars.len() - 4))
    }

    /// Returns the first required field that is empty.
    fn missing_field(&self) -> Option<&'static str> {
        if self.provider().requires_key() && self.key.trim().is_empty() {
            Some("key")
        } else if self.url.trim().is_empty() {
            Some("url")
        } else {
            None
        }
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// The `[settings]` table.
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Checks that every required field is present.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        match self.settings.missing_field() {
            Some(field) => Err(ConfigError::Incomplete {
                field,
                path: path.to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}

/// Loads, prompts for and persists the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    env: EnvSource,
}

impl ConfigManager {
    /// Creates a manager for the default path, reading the process environment.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(Self::default_path()?))
    }

    /// Creates a manager for a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env: EnvSource::process(),
        }
    }

    /// Replaces the environment the overlay reads from.
    #[must_use]
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// `~/.config/ai-commit/ai-commit.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(".config").join("ai-commit").join("ai-commit.toml"))
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the configuration to use for this run.
    ///
    /// With `interactive` set, or when no file exists and the environment
    /// does not supply a complete configuration, the user is prompted and
    /// the answers are saved. Otherwise the file is read, the environment
    /// overlaid and the result validated.
    pub fn load(&self, interactive: bool, prompter: &dyn Prompter) -> Result<Config> {
        if interactive {
            return self.prompt_and_save(prompter);
        }

        if let Some(config) = self.read_file()? {
            let config = self.apply_env(config)?;
            config.validate(&self.config_path)?;
            return Ok(config);
        }

        let from_env = self.apply_env(Config::default())?;
        if from_env.validate(&self.config_path).is_ok() {
            info!("No configuration file, using environment variables");
            return Ok(from_env);
        }

        println!(
            "No configuration found at {}, let's create one.",
            self.config_path.display()
        );
        self.prompt_and_save(prompter)
    }

    /// Reads the file, returning `None` if it does not exist.
    pub fn read_file(&self) -> Result<Option<Config>> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "Configuration file not found");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.config_path).with_context(|| {
            format!(
                "Failed to read configuration file: {}",
                self.config_path.display()
            )
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.config_path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(config))
    }

    /// Writes the configuration, creating parent directories.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create configuration directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write configuration file: {}",
                self.config_path.display()
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.config_path, fs::Permissions::from_mode(0o600))
                .with_context(|| {
                    format!(
                        "Failed to restrict permissions on {}",
                        self.config_path.display()
                    )
                })?;
        }

        info!(path = %self.config_path.display(), "Saved configuration");
        Ok(())
    }

    /// Overrides file values with any environment variables that are set.
    pub fn apply_env(&self, mut config: Config) -> Result<Config, ConfigError> {
        let settings = &mut config.settings;
        if let Some(provider) = self.env.get_env_var(PROVIDER_VAR) {
            settings.provider = Some(provider.parse()?);
        }
        if let Some(key) = self.env.get_env_vars(KEY_VARS) {
            settings.key = key;
        }
        if let Some(url) = self.env.get_env_vars(URL_VARS) {
            settings.url = url;
        }
        if let Some(model) = self.env.get_env_var(MODEL_VAR) {
            settings.model = Some(model);
        }
        Ok(config)
    }

    fn prompt_and_save(&self, prompter: &dyn Prompter) -> Result<Config> {
        let config = prompt_for_config(prompter)?;
        config.validate(&self.config_path)?;
        self.save(&config)?;
        println!("Configuration saved to {}", self.config_path.display());
        Ok(config)
    }

    /// Human-readable summary with the key masked.
    pub fn describe(&self, config: &Config) -> String {
        let settings = &config.settings;
        format!(
            "Configuration file: {}\nProvider: {}\nURL: {}\nModel: {}\nKey: {}",
            self.config_path.display(),
            settings.provider(),
            if settings.url.is_empty() {
                "(not set)"
            } else {
                settings.url.as_str()
            },
            settings.model(),
            settings.masked_key(),
        )
    }
}

/// Asks for provider, key and URL.
fn prompt_for_config(prompter: &dyn Prompter) -> Result<Config> {
    let names: Vec<&str> = Provider::ALL.iter().map(|p| p.as_str()).collect();
    let provider = Provider::ALL[prompter.select("Provider", &names)?];

    let key = if provider.requires_key() {
        prompter.required_input("API key", true)?.trim().to_string()
    } else {
        String::new()
    };

    let url = match provider.default_url() {
        Some(default) => {
            let url = prompter
                .input(&format!("Endpoint URL (blank for {default})"), false)?
                .trim()
                .to_string();
            if url.is_empty() {
                default.to_string()
            } else {
                url
            }
        }
        None => prompter
            .required_input("Endpoint URL", false)?
            .trim()
            .to_string(),
    };

    Ok(Config {
        settings: Settings {
            key,
            url,
            provider: Some(provider),
            model: None,
        },
    })
}
