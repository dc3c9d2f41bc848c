//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub replicate: ReplicateConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub booth: BoothConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole HTTP request, generation included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Front-end assets, served when the directory exists
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Largest accepted request body; captures arrive as base64 JSON
    #[serde(default = "default_max_body")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    300
}

fn default_static_dir() -> String {
    "./static".to_string()
}

fn default_max_body() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            static_dir: default_static_dir(),
            max_body_bytes: default_max_body(),
        }
    }
}

/// Inference provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplicateConfig {
    #[serde(default = "default_replicate_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Per-request limit; a `Prefer: wait` create call is held open by the provider
    #[serde(default = "default_replicate_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

fn default_replicate_base() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_poll_timeout() -> u64 {
    240
}

fn default_replicate_timeout() -> u64 {
    120_000
}

fn default_connect_timeout() -> u64 {
    10_000
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            api_base: default_replicate_base(),
            api_token: None,
            poll_interval_ms: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            timeout_ms: default_replicate_timeout(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

/// SMTP relay configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
    /// Sender address; the SMTP user when unset
    #[serde(default)]
    pub from: Option<String>,
}

impl SmtpConfig {
    /// True when every field needed to authenticate against the relay is present
    pub fn is_complete(&self) -> bool {
        [&self.host, &self.user, &self.pass]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
            && self.port.is_some()
    }
}

/// Cloud drive archive configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriveConfig {
    /// Path to a service-account key file
    #[serde(default)]
    pub credentials_path: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_drive_api_base")]
    pub api_base: String,
    #[serde(default = "default_drive_upload_base")]
    pub upload_base: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_drive_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_drive_upload_base() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            folder_id: None,
            token_uri: default_token_uri(),
            api_base: default_drive_api_base(),
            upload_base: default_drive_upload_base(),
        }
    }
}

/// Wizard policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoothConfig {
    #[serde(default = "default_max_retakes")]
    pub max_retakes: u32,
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,
    #[serde(default = "default_progress_cap")]
    pub progress_cap: u8,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_themes")]
    pub themes: Vec<String>,
    #[serde(default = "default_styles")]
    pub styles: Vec<String>,
}

fn default_max_retakes() -> u32 {
    1
}

fn default_progress_step() -> u8 {
    5
}

fn default_progress_interval() -> u64 {
    1000
}

fn default_progress_cap() -> u8 {
    95
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_themes() -> Vec<String> {
    [
        "Cyberpunk Character",
        "Fantasy Warrior",
        "Steampunk Explorer",
        "Space Traveler",
        "Medieval Knight",
        "Pirate Captain",
        "Superhero",
        "Wizard",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_styles() -> Vec<String> {
    vec!["photographic".to_string(), "cinematic".to_string()]
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            max_retakes: default_max_retakes(),
            progress_step: default_progress_step(),
            progress_interval_ms: default_progress_interval(),
            progress_cap: default_progress_cap(),
            session_ttl_secs: default_session_ttl(),
            themes: default_themes(),
            styles: default_styles(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_true() -> bool {
    true
}

fn default_rps() -> u32 {
    10
}

fn default_burst() -> u32 {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        let path = non_empty_env("SELFIE_BOOTH_CONFIG")
            .unwrap_or_else(|| "config/default.toml".to_string());
        Self::load_from_path(path)
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_str().unwrap_or("config/default");

        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .add_source(File::with_name(path).required(false))
            // Override with environment variables (prefixed with SELFIE_BOOTH__)
            .add_source(
                Environment::with_prefix("SELFIE_BOOTH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain variables used by existing deployments take precedence
            .set_override_option("replicate.api_token", non_empty_env("REPLICATE_API_TOKEN"))?
            .set_override_option("smtp.host", non_empty_env("SMTP_HOST"))?
            .set_override_option(
                "smtp.port",
                non_empty_env("SMTP_PORT")
                    .and_then(|p| p.parse::<u16>().ok())
                    .map(i64::from),
            )?
            .set_override_option("smtp.user", non_empty_env("SMTP_USER"))?
            .set_override_option("smtp.pass", non_empty_env("SMTP_PASS"))?
            .set_override_option(
                "drive.credentials_path",
                non_empty_env("GOOGLE_APPLICATION_CREDENTIALS"),
            )?
            .set_override_option("drive.folder_id", non_empty_env("GOOGLE_DRIVE_FOLDER_ID"))?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }
        if self.booth.themes.is_empty() {
            return Err(invalid("At least one booth theme is required"));
        }
        if self.booth.styles.is_empty() {
            return Err(invalid("At least one booth style is required"));
        }
        if self.booth.progress_interval_ms == 0 {
            return Err(invalid("Progress interval cannot be 0"));
        }
        if self.booth.progress_cap > 100 {
            return Err(invalid("Progress cap cannot exceed 100"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}
