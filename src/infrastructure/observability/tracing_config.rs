use crate::config::{Environment, LoggingSettings};

pub const DEFAULT_FILTER: &str = "info,askdocx=debug";

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub default_filter: String,
}

impl TracingConfig {
    pub fn new(environment: impl Into<String>, json_format: bool) -> Self {
        Self {
            environment: environment.into(),
            json_format,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }

    /// `LOG_FORMAT=json` forces JSON output even when the settings ask for text.
    pub fn from_settings(logging: &LoggingSettings, environment: Environment) -> Self {
        let config = Self::new(
            environment.as_str(),
            logging.json_format || log_format_is_json(),
        );

        match &logging.filter {
            Some(filter) => config.with_default_filter(filter.clone()),
            None => config,
        }
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new(
            std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),
            log_format_is_json(),
        )
    }
}

fn log_format_is_json() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
