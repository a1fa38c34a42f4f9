//! Waitlist configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WaitlistError};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitlistConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub urgency: UrgencyConfig,
    #[serde(default)]
    pub sms: SmsConfig,
}

impl WaitlistConfig {
    /// Load config from the default path (~/.waitlist/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WaitlistError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| WaitlistError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| WaitlistError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay Twilio credentials from the environment, when set.
    pub fn apply_env(&mut self) {
        if let Ok(sid) = std::env::var("WAITLIST_TWILIO_ACCOUNT_SID") {
            self.sms.account_sid = sid;
        }
        if let Ok(token) = std::env::var("WAITLIST_TWILIO_AUTH_TOKEN") {
            self.sms.auth_token = token;
        }
        if let Ok(from) = std::env::var("WAITLIST_TWILIO_FROM") {
            self.sms.from_number = from;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.urgency.threshold_ms == 0 {
            return Err(WaitlistError::Config(
                "urgency.threshold_ms must be greater than zero".into(),
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(WaitlistError::Config("database.path must not be empty".into()));
        }
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the waitlist home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".waitlist")
    }
}

/// Durable storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "~/.waitlist/waitlist.db".into() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

impl DatabaseConfig {
    /// Database path with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

/// Wait-urgency configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgencyConfig {
    /// Waiting time (ms) at which a party is considered to have waited too long.
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: u64,
}

fn default_threshold_ms() -> u64 { 60_000 }

impl Default for UrgencyConfig {
    fn default() -> Self {
        Self { threshold_ms: default_threshold_ms() }
    }
}

/// SMS (Twilio) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    /// Source number messages are sent from.
    #[serde(default)]
    pub from_number: String,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Send at most one message per guest, however often they reach second place.
    #[serde(default = "bool_true")]
    pub once_per_guest: bool,
}

fn bool_true() -> bool { true }
fn default_message() -> String {
    "You are now second in the waiting list. Your host will be with you soon.".into()
}
fn default_api_base() -> String { "https://api.twilio.com".into() }
fn default_timeout_secs() -> u64 { 10 }

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            message: default_message(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            once_per_guest: true,
        }
    }
}

impl SmsConfig {
    /// Credentials and source number are all present.
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_number.is_empty()
    }
}
