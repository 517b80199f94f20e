use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "CONTACT_ASSIST_API_URL";
/// Environment variable overriding `api.token`
pub const API_TOKEN_ENV: &str = "CONTACT_ASSIST_TOKEN";

const MAX_DEBOUNCE_MS: u64 = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub mentions: MentionConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend origin, without the `/api/v1` suffix (default: http://localhost:3000)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Settings for the @-mention picker in the assistant box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionConfig {
    /// Character that opens a mention token (default: '@')
    #[serde(default = "default_marker")]
    pub marker: char,

    /// Quiet interval before a candidate search is issued (default: 200ms)
    #[serde(default = "default_mention_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of candidates requested per search (default: 10)
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

/// Settings for the global command palette
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteConfig {
    /// Quiet interval before the contact search is issued (default: 300ms)
    #[serde(default = "default_palette_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of contacts mixed into the palette (default: 5)
    #[serde(default = "default_contact_limit")]
    pub contact_limit: usize,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_marker() -> char {
    '@'
}

fn default_mention_debounce_ms() -> u64 {
    200
}

fn default_search_limit() -> usize {
    10
}

fn default_palette_debounce_ms() -> u64 {
    300
}

fn default_contact_limit() -> usize {
    5
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MentionConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            debounce_ms: default_mention_debounce_ms(),
            search_limit: default_search_limit(),
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_palette_debounce_ms(),
            contact_limit: default_contact_limit(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            mentions: MentionConfig::default(),
            palette: PaletteConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MentionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl PaletteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Strip a trailing `/api/v1` (and trailing slashes): endpoint paths carry it
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api/v1").unwrap_or(trimmed);
    trimmed.trim_end_matches('/').to_string()
}

impl Config {
    /// Load from the config file (defaults if absent), then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env();
        config.sanitize();
        Ok(config)
    }

    /// The config file alone, without env overrides; what `save` should start from
    pub fn load_file() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.sanitize();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;
        Ok(config_dir.join("contact-assist").join("config.toml"))
    }

    /// Where the TUI writes its tracing output
    pub fn log_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .or_else(dirs::cache_dir)
            .context("Could not determine data directory")?;
        Ok(data_dir.join("contact-assist").join("contact-assist.log"))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.api.token = Some(token);
            }
        }
    }

    fn sanitize(&mut self) {
        self.api.base_url = normalize_base_url(&self.api.base_url);
        if self.api.timeout_secs == 0 {
            self.api.timeout_secs = default_timeout_secs();
        }
        if self.mentions.marker.is_whitespace() || self.mentions.marker.is_control() {
            tracing::warn!(
                "Ignoring unusable mention marker {:?}, using {:?}",
                self.mentions.marker,
                default_marker()
            );
            self.mentions.marker = default_marker();
        }
        self.mentions.debounce_ms = self.mentions.debounce_ms.min(MAX_DEBOUNCE_MS);
        self.mentions.search_limit = self.mentions.search_limit.max(1);
        self.palette.debounce_ms = self.palette.debounce_ms.min(MAX_DEBOUNCE_MS);
        self.palette.contact_limit = self.palette.contact_limit.max(1);
    }
}
