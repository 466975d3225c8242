//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds all shared resources: the
//! configuration, the database provider, the generation executor and the
//! rate limiter.

use crate::config::AppConfig;
use anyhow::Context;
use goldsql::{
    providers::{
        ai::{AiProvider, DecodingSettings},
        db::sqlite::SqliteProvider,
        factory::create_provider,
    },
    FixedWindowRateLimiter, GenerationExecutor, PromptTemplate, RateLimiter, SqlGenerator,
};
use std::{sync::Arc, time::Duration};
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The application database: schema documents, gold SQL and audit logs.
    pub sqlite_provider: Arc<SqliteProvider>,
    pub executor: Arc<GenerationExecutor>,
    /// Per-user throttling for the generation endpoint.
    pub rate_limiter: Arc<dyn RateLimiter>,
}

/// Builds the shared application state from the configuration.
///
/// This function initializes all necessary services:
/// - It instantiates the AI provider named by `generation.provider`.
/// - It opens the SQLite database and ensures its tables exist.
/// - It creates the rate limiter from `rate_limit`.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let provider_key = &config.generation.provider;
    let provider_config = config.providers.get(provider_key).with_context(|| {
        format!("generation provider '{provider_key}' is not defined under 'providers'")
    })?;
    let settings = DecodingSettings {
        max_tokens: config.generation.max_tokens,
        ..DecodingSettings::default()
    };
    let ai_provider = create_provider(provider_key, provider_config, settings)?;

    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    sqlite_provider.initialize_schema().await?;

    let rate_limiter = Arc::new(FixedWindowRateLimiter::new(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
    ));

    build_app_state_with(config, sqlite_provider, ai_provider, rate_limiter)
}

/// Builds the state from already constructed collaborators.
///
/// Validates the configured template, so a bad template fails startup
/// rather than the first request.
pub fn build_app_state_with(
    config: AppConfig,
    sqlite_provider: SqliteProvider,
    ai_provider: Box<dyn AiProvider>,
    rate_limiter: Arc<dyn RateLimiter>,
) -> anyhow::Result<AppState> {
    let generation = &config.generation;
    let mut builder = SqlGenerator::builder().ai_provider(ai_provider);
    if let Some(text) = &generation.template {
        let template = PromptTemplate::new(text.as_str(), generation.template_version.as_str())
            .context("invalid generation.template")?;
        builder = builder.template(template);
    }
    if let Some(metrics) = &generation.metrics_text {
        builder = builder.metrics_text(metrics.as_str());
    }
    let generator = builder.build()?;

    info!(
        model = %generator.model_name(),
        prompt_version = %generator.prompt_version(),
        max_examples = generation.max_examples,
        "SQL generator ready"
    );

    let executor = GenerationExecutor::new(
        generator,
        Box::new(sqlite_provider.clone()),
        Box::new(sqlite_provider.clone()),
    )
    .with_max_examples(generation.max_examples);

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider: Arc::new(sqlite_provider),
        executor: Arc::new(executor),
        rate_limiter,
    })
}
