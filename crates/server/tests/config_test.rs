//! # Configuration Tests
//!
//! These tests mutate process environment variables, so each one runs
//! under `#[serial]`.

use goldsql::FixedWindowRateLimiter;
use goldsql_server::{
    config::{get_config, AppConfig, ConfigError, DEFAULT_PROVIDER_KEY},
    state::build_app_state_with,
};
use goldsql_test_utils::{MockAiProvider, TestSetup};
use serial_test::serial;
use std::{env, fs, sync::Arc, time::Duration};
use tempfile::tempdir;

const ENV_VARS: [&str; 6] = [
    "PORT",
    "DB_URL",
    "OPENAI_API_KEY",
    "GOLDSQL_TEST_API_KEY",
    "GOLDSQL_RATE_LIMIT__MAX_REQUESTS",
    "GOLDSQL_GENERATION__MAX_EXAMPLES",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn write_config(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, content).unwrap();
    let path = path.to_str().unwrap().to_string();
    (dir, path)
}

#[test]
#[serial]
fn test_defaults_without_a_file() {
    clear_env();
    env::set_var("OPENAI_API_KEY", "sk-default");

    let config = get_config(None).unwrap();

    assert_eq!(config.port, 9090);
    assert_eq!(config.db_url, "db/goldsql.db");
    let provider = &config.providers[DEFAULT_PROVIDER_KEY];
    assert_eq!(provider.provider, "openai");
    assert_eq!(provider.model_name, "gpt-4o");
    assert_eq!(provider.api_key.as_deref(), Some("sk-default"));
    assert_eq!(config.generation.provider, DEFAULT_PROVIDER_KEY);
    assert_eq!(config.generation.max_examples, 3);
    assert_eq!(config.generation.max_tokens, 4096);
    assert_eq!(config.generation.template_version, "v1.0");
    assert_eq!(config.rate_limit.max_requests, 10);
    assert_eq!(config.rate_limit.window_secs, 60);
    clear_env();
}

#[test]
#[serial]
fn test_file_values_and_substitution() {
    clear_env();
    env::set_var("GOLDSQL_TEST_API_KEY", "secret-from-env");
    let (_dir, path) = write_config(
        r#"
port: 8181
db_url: "db/test.db"
providers:
  gemini_flash:
    provider: "gemini"
    api_key: "${GOLDSQL_TEST_API_KEY}"
    model_name: "gemini-2.0-flash"
generation:
  provider: "gemini_flash"
  max_examples: 5
  metrics_text: "■ 売上 = SUM(amount)"
rate_limit:
  window_secs: 30
"#,
    );

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(config.port, 8181);
    assert_eq!(config.db_url, "db/test.db");
    let gemini = &config.providers["gemini_flash"];
    assert_eq!(gemini.api_key.as_deref(), Some("secret-from-env"));
    assert_eq!(gemini.api_url, None);
    // The default provider is still available alongside the file's providers.
    assert!(config.providers.contains_key(DEFAULT_PROVIDER_KEY));
    assert_eq!(config.generation.provider, "gemini_flash");
    assert_eq!(config.generation.max_examples, 5);
    assert_eq!(
        config.generation.metrics_text.as_deref(),
        Some("■ 売上 = SUM(amount)")
    );
    assert_eq!(config.rate_limit.max_requests, 10);
    assert_eq!(config.rate_limit.window_secs, 30);
    clear_env();
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("PORT", "7070");
    env::set_var("GOLDSQL_RATE_LIMIT__MAX_REQUESTS", "2");
    env::set_var("GOLDSQL_GENERATION__MAX_EXAMPLES", "1");
    let (_dir, path) = write_config(
        r#"
port: 8181
generation:
  max_examples: 5
rate_limit:
  max_requests: 50
"#,
    );

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(config.port, 7070);
    assert_eq!(config.rate_limit.max_requests, 2);
    assert_eq!(config.generation.max_examples, 1);
    clear_env();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_not_found() {
    clear_env();
    let result = get_config(Some("/nonexistent/goldsql/config.yml"));

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_template_fails_startup() {
    let setup = TestSetup::new().await.unwrap();
    let mut config = AppConfig::default();
    config.generation.template = Some("{DB_TYPE} {USER_INPUT}".to_string());

    let result = build_app_state_with(
        config,
        setup.provider,
        Box::new(MockAiProvider::new()),
        Arc::new(FixedWindowRateLimiter::new(1, Duration::from_secs(60))),
    );

    let err = result.err().expect("startup should fail");
    assert!(err.to_string().contains("invalid generation.template"));
}

#[tokio::test]
async fn test_custom_template_sets_prompt_version() {
    let setup = TestSetup::new().await.unwrap();
    let mut config = AppConfig::default();
    config.generation.template = Some(
        "{DB_TYPE}\n{SCHEMA_TEXT}\n{METRICS_TEXT}\n{GOLD_SQL_EXAMPLES}\n{USER_INPUT}".to_string(),
    );
    config.generation.template_version = "v2.0-beta".to_string();

    let state = build_app_state_with(
        config,
        setup.provider,
        Box::new(MockAiProvider::new()),
        Arc::new(FixedWindowRateLimiter::new(1, Duration::from_secs(60))),
    )
    .unwrap();

    assert_eq!(state.executor.generator().prompt_version(), "v2.0-beta");
}
