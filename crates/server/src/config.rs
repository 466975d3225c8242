//! # Application Configuration
//!
//! This module defines the configuration structure for the `goldsql-server` and
//! provides the logic for loading it from a `config.yml` file and environment
//! variables.

use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use goldsql::constants::{
    DEFAULT_DB_FILE, DEFAULT_MAX_EXAMPLES, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_PROMPT_VERSION,
    DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS,
};
use goldsql::providers::factory::ProviderConfig;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use tracing::info;

/// The provider key used when the configuration does not name one.
pub const DEFAULT_PROVIDER_KEY: &str = "openai_default";

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

impl From<regex::Error> for ConfigError {
    fn from(err: regex::Error) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// A map of named, reusable AI provider configurations.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_url: default_db_url(),
            providers: HashMap::new(),
            generation: GenerationConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    DEFAULT_DB_FILE.to_string()
}

/// Settings for the SQL generation pipeline.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GenerationConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default = "default_provider_key")]
    pub provider: String,
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Replaces the built-in metric definitions block.
    #[serde(default)]
    pub metrics_text: Option<String>,
    /// Replaces the built-in prompt template. Must contain all five slots.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default = "default_template_version")]
    pub template_version: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider_key(),
            max_examples: default_max_examples(),
            max_tokens: default_max_tokens(),
            metrics_text: None,
            template: None,
            template_version: default_template_version(),
        }
    }
}

fn default_provider_key() -> String {
    DEFAULT_PROVIDER_KEY.to_string()
}

fn default_max_examples() -> usize {
    DEFAULT_MAX_EXAMPLES
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

fn default_template_version() -> String {
    DEFAULT_PROMPT_VERSION.to_string()
}

/// Per-user request quota for the generation endpoint.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_requests() -> u32 {
    DEFAULT_RATE_LIMIT_MAX_REQUESTS
}

fn default_window_secs() -> u64 {
    DEFAULT_RATE_LIMIT_WINDOW_SECS
}

/// Builds the default provider entry: OpenAI `gpt-4o`, keyed from `OPENAI_API_KEY`.
fn build_default_providers() -> HashMap<String, ConfigValue> {
    let mut table = HashMap::new();
    table.insert("provider".to_string(), ConfigValue::from("openai"));
    table.insert("model_name".to_string(), ConfigValue::from("gpt-4o"));
    if let Ok(key) = env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            table.insert("api_key".to_string(), ConfigValue::from(key));
        }
    }

    HashMap::from([(
        DEFAULT_PROVIDER_KEY.to_string(),
        ConfigValue::new(None, ConfigValueKind::Table(table)),
    )])
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - An explicit path must exist. Without one, `config.yml` next to this
///   crate's manifest is used when present, and the built-in defaults otherwise.
/// - Top-level keys like `port` and `db_url` are overridden by `PORT` and `DB_URL`.
/// - Nested keys are overridden by `GOLDSQL_...` variables (e.g., `GOLDSQL_RATE_LIMIT__MAX_REQUESTS`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults.
        .set_default("providers", build_default_providers())?;

    // Layer 2: Main config file.
    let main_content = match config_path_override {
        Some(path) => Some(read_and_substitute(path)?.ok_or_else(|| {
            ConfigError::NotFound(format!("Config file not found at '{path}'."))
        })?),
        None => {
            let user_config_path = format!("{base_path}/config.yml");
            let content = read_and_substitute(&user_config_path)?;
            match &content {
                Some(_) => info!("Loading configuration from '{user_config_path}'."),
                None => info!("'{user_config_path}' not found. Using built-in defaults."),
            }
            content
        }
    };
    if let Some(content) = main_content {
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    let settings = builder
        // Layer 3: Load environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 4: Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("GOLDSQL")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
