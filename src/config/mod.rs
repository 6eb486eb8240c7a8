mod env_manager;

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{CriticError, Result};
use std::fs;
use log::{debug, info};

pub use env_manager::{clean_keys, collect_api_keys, get_env_value, parse_list};

/// Default GitHub REST API endpoint
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
/// Default Gemini REST API endpoint
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
/// Origin of the hosted frontend
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://codecritic.vercel.app";

/// Main configuration struct for the application
///
/// Holds the GitHub credentials, the Gemini key pool used for rotation,
/// HTTP server settings and the snapshot fetch bounds. Every section has
/// defaults so a partial TOML file is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub API token for authenticated requests
    pub github_token: Option<String>,
    /// Base URL of the GitHub REST API
    pub github_api_url: String,
    /// Gemini text-generation settings
    pub gemini: GeminiSettings,
    /// HTTP server settings
    pub server: ServerSettings,
    /// Bounds on the commit and issue lists attached to a snapshot
    pub limits: FetchLimits,
    /// Timeout applied to every outbound HTTP request
    pub request_timeout_seconds: u64,
}

/// Settings for the Gemini generation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API keys in rotation order
    pub api_keys: Vec<String>,
    /// Model name used in the `generateContent` path
    pub model: String,
    /// Base URL of the Gemini REST API
    pub api_url: String,
    /// Timeout for a single generation call
    pub timeout_seconds: u64,
}

/// Settings for the HTTP server binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address the server binds to
    pub bind_address: String,
    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
}

/// Bounds on the per-repository commit and issue fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchLimits {
    /// Maximum number of recent commits
    pub commits: usize,
    /// Maximum number of open issues
    pub issues: usize,
}

impl Config {
    /// Loads configuration from the default config file location, then
    /// applies environment overrides.
    ///
    /// A `.env` file in the working directory is read first. A missing
    /// config file is not an error.
    pub fn load() -> Result<Self> {
        if dotenv::dotenv().is_ok() {
            debug!("Loaded environment from .env");
        }

        let config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        Ok(config.with_env_overrides())
    }

    /// Reads a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CriticError::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        let mut config: Self = toml::from_str(&content)?;
        config.gemini.api_keys = clean_keys(config.gemini.api_keys);
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Location of the optional config file: `<config_dir>/codecritic/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("codecritic").join("config.toml"))
    }

    /// Applies environment variables on top of the current values
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(token) = get_env_value("GITHUB_TOKEN") {
            self.github_token = Some(token);
        }
        if let Some(url) = get_env_value("GITHUB_API_BASE_URL") {
            self.github_api_url = url;
        }

        let keys = collect_api_keys();
        if !keys.is_empty() {
            self.gemini.api_keys = keys;
        }
        if let Some(model) = get_env_value("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(url) = get_env_value("GEMINI_API_BASE_URL") {
            self.gemini.api_url = url;
        }

        if let Some(bind) = get_env_value("CODECRITIC_BIND") {
            self.server.bind_address = bind;
        }
        if let Some(origins) = get_env_value("ALLOWED_ORIGINS") {
            self.server.allowed_origins = parse_list(&origins);
        }
        self
    }

    /// Validates that at least one usable Gemini API key is configured
    pub fn ensure_keys(&self) -> Result<()> {
        if self.gemini.api_keys.iter().all(|k| k.trim().is_empty()) {
            return Err(CriticError::Config(
                "No Gemini API keys configured (set GEMINI_API_KEY or GEMINI_API_KEYS)".into(),
            ));
        }
        Ok(())
    }

    /// Validates that a configured GitHub token is not blank
    pub fn ensure_tokens(&self) -> Result<()> {
        if let Some(token) = &self.github_token {
            if token.trim().is_empty() {
                return Err(CriticError::Config("GitHub token is empty".into()));
            }
        }
        Ok(())
    }

    /// Runs every validation check
    pub fn validate(&self) -> Result<()> {
        self.ensure_tokens()?;
        self.ensure_keys()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            gemini: GeminiSettings::default(),
            server: ServerSettings::default(),
            limits: FetchLimits::default(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
            timeout_seconds: 120,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
        }
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            commits: 5,
            issues: 5,
        }
    }
}
