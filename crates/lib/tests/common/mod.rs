#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared helpers for the library tests: tracing setup, a scripted mock
//! backend and builders for reference examples.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use dotenvy::dotenv;
use goldsql::{
    providers::ai::{AiProvider, DecodingSettings},
    Dialect, GenerationError, ReferenceExample,
};
use std::sync::{Arc, Once, RwLock};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const MOCK_MODEL: &str = "mock-model";

// --- Mock AI Provider ---

/// A backend that replays queued responses and records every call.
///
/// Queued `Err` strings are returned as backend failures. Once the queue is
/// empty, every call fails.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    pub call_history: Arc<RwLock<Vec<(String, String)>>>,
    responses: Arc<RwLock<Vec<Result<String, String>>>>,
}

impl MockAiProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(responses: Vec<Result<String, String>>) -> Self {
        Self {
            call_history: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(responses.into_iter().rev().collect())),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.call_history.read().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        self.call_history
            .write()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        match self.responses.write().unwrap().pop() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(GenerationError::Backend(message)),
            None => Err(GenerationError::Backend("no scripted response".into())),
        }
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }

    fn settings(&self) -> DecodingSettings {
        DecodingSettings::default()
    }
}

// --- Fixtures ---

/// An active example updated `minutes_ago` minutes before a fixed instant.
pub fn example(
    id: &str,
    title: &str,
    description: Option<&str>,
    dialect: Dialect,
    sql: &str,
    minutes_ago: i64,
) -> ReferenceExample {
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    ReferenceExample {
        id: id.to_string(),
        title: title.to_string(),
        description: description.map(String::from),
        dialect,
        sql: sql.to_string(),
        tags: Vec::new(),
        is_active: true,
        updated_at: base - Duration::minutes(minutes_ago),
    }
}
