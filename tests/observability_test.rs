use askdocx::config::{Environment, LoggingSettings};
use askdocx::infrastructure::observability::{
    DEFAULT_FILTER, TracingConfig, init_tracing, sanitize_prompt,
};

#[test]
fn given_explicit_values_when_creating_config_then_uses_default_filter() {
    let config = TracingConfig::new("test", true);

    assert_eq!(config.environment, "test");
    assert!(config.json_format);
    assert_eq!(config.default_filter, DEFAULT_FILTER);
}

#[test]
fn given_default_config_when_created_then_environment_is_set() {
    let config = TracingConfig::default();
    assert!(!config.environment.is_empty());
}

#[test]
fn given_logging_settings_when_building_config_then_carries_environment_format_and_filter() {
    let logging = LoggingSettings {
        json_format: true,
        filter: Some("askdocx=trace".to_string()),
    };

    let config = TracingConfig::from_settings(&logging, Environment::Prod);

    assert_eq!(config.environment, "prod");
    assert!(config.json_format);
    assert_eq!(config.default_filter, "askdocx=trace");
}

#[test]
fn given_logging_settings_without_filter_when_building_config_then_keeps_default_filter() {
    let config = TracingConfig::from_settings(&LoggingSettings::default(), Environment::Test);

    assert_eq!(config.environment, "test");
    assert_eq!(config.default_filter, DEFAULT_FILTER);
}

#[test]
fn given_subscriber_already_installed_when_initializing_again_then_returns_error() {
    let config = TracingConfig::new("test", false).with_default_filter("warn");

    let first = init_tracing(config.clone());
    let second = init_tracing(config);

    assert!(first.is_ok());
    assert!(second.is_err());
}

#[test]
fn given_blank_prompt_when_sanitizing_then_returns_marker() {
    assert_eq!(sanitize_prompt("  \n "), "[EMPTY]");
}

#[test]
fn given_long_multibyte_prompt_when_sanitizing_then_truncates_on_characters() {
    let prompt = "ü".repeat(150);

    let sanitized = sanitize_prompt(&prompt);

    assert!(sanitized.starts_with(&"ü".repeat(100)));
    assert!(sanitized.ends_with("... (150 chars total)"));
}

#[test]
fn given_repeated_secrets_when_sanitizing_then_redacts_every_occurrence() {
    let sanitized = sanitize_prompt("token=abc123 and later token=def456&x=1");

    assert_eq!(sanitized, "token=[REDACTED] and later token=[REDACTED]&x=1");
}

#[test]
fn given_bearer_header_when_sanitizing_then_redacts_credential() {
    let sanitized = sanitize_prompt("Authorization: Bearer eyJhbGciOi rest");

    assert_eq!(sanitized, "Authorization: Bearer [REDACTED] rest");
}
