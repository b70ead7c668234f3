use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Context, OptionExt, Result};
use serde::{Deserialize, Serialize};

use crate::llm::LlmProvider;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub proxy: ProxyConfig,
    pub llm: LlmConfig,
    pub spotify: SpotifyConfig,
    /// Where the single cached Spotify session lives
    pub session_file: Option<String>,
}

/// Where the client finds the two proxies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub auth_url: String,
    pub generate_url: String,
    pub timeout: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            auth_url: "http://localhost:3000".to_string(),
            generate_url: "http://localhost:5001".to_string(),
            timeout: "45s".to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_timeout(&self.timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Openai,
            model: None,
            base_url: None,
            temperature: 0.8,
            max_tokens: 600,
            timeout: "30s".to_string(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_timeout(&self.timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Public client id, used by `login` to build the authorize URL
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub timeout: String,
    /// How many searches run at once while resolving queries
    pub resolve_concurrency: usize,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            redirect_uri: None,
            timeout: "10s".to_string(),
            resolve_concurrency: 4,
        }
    }
}

impl SpotifyConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_timeout(&self.timeout)
    }
}

fn parse_timeout(value: &str) -> Result<Duration> {
    humantime::parse_duration(value).wrap_err_with(|| format!("Invalid timeout: `{}`", value))
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        // Validate durations up front so a typo fails at startup
        config.proxy.timeout()?;
        config.llm.timeout()?;
        config.spotify.timeout()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("tunesmith").join("config.toml"))
    }

    /// Load the default config file, falling back to defaults when it doesn't exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Write a default config file, unless one already exists
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("No config directory on this platform")?;
        if path.exists() {
            log::info!("Config already exists at {}", path.display());
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Session file path, defaulting to the platform data directory
    pub fn session_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.session_file {
            return Ok(self.expand_path(path));
        }
        dirs::data_dir()
            .map(|path| path.join("tunesmith").join("session.json"))
            .ok_or_eyre("No data directory on this platform, set `session_file` in the config")
    }
}
