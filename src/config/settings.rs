use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, ConfigError, File};
use serde::Deserialize;

use super::Environment;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            connect_retries: default_connect_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub max_upload_bytes: usize,
    pub timeout_secs: u64,
    /// Per stream (PDF) or per package part (OOXML).
    pub max_decompressed_bytes: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: 16 * MIB,
            timeout_secs: 30,
            max_decompressed_bytes: 64 * MIB,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub preview_chars: usize,
    pub max_append_attempts: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            preview_chars: 100,
            max_append_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSettings {
    pub json_format: bool,
    /// Filter used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_retries() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Reads `.env`, then `appsettings.{environment}` if present, then
    /// `APP_`-prefixed environment variables (`APP_DATABASE__URL`, ...).
    pub fn load() -> Result<(Self, Environment), ConfigError> {
        dotenvy::dotenv().ok();

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(ConfigError::Message)?;

        let builder = Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                ::config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok((Self::build(builder)?, environment))
    }

    pub fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
