use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goldsql::errors::GenerationError;
use goldsql::providers::ai::{AiProvider, DecodingSettings};
use goldsql::providers::db::sqlite::SqliteProvider;
use goldsql::{Dialect, ReferenceExample, SchemaDocument};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub provider: SqliteProvider,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database and initializes the schema.
    pub async fn new() -> Result<Self> {
        let provider = SqliteProvider::new(":memory:").await?;
        provider.initialize_schema().await?;
        Ok(Self { provider })
    }

    /// Stores and activates a schema document for `dialect`.
    pub async fn with_schema(
        &self,
        dialect: Dialect,
        version: &str,
        content: &str,
    ) -> Result<SchemaDocument> {
        Ok(self
            .provider
            .save_schema_document(dialect, version, content, true)
            .await?)
    }

    /// Stores an active gold SQL example.
    pub async fn with_gold_sql(
        &self,
        id: &str,
        title: &str,
        dialect: Dialect,
        sql: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<ReferenceExample> {
        let example = ReferenceExample {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            dialect,
            sql: sql.to_string(),
            tags: Vec::new(),
            is_active: true,
            updated_at,
        };
        self.provider.save_gold_sql(&example).await?;
        Ok(example)
    }
}

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
pub struct MockAiProvider {
    responses: Arc<Mutex<Vec<(String, String)>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    pub const MODEL: &'static str = "mock-sql-model";

    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-programs a response for a specific prompt.
    /// The key should be a unique substring of the user prompt; the first
    /// programmed key that matches wins.
    pub fn add_response(&self, key: &str, response: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.push((key.to_string(), response.to_string()));
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((system_prompt.to_string(), user_prompt.to_string()));

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if user_prompt.contains(key.as_str()) {
                return Ok(response.clone());
            }
        }

        Err(GenerationError::Backend(format!(
            "MockAiProvider: No response programmed for prompt. Got: '{user_prompt}'"
        )))
    }

    fn model_name(&self) -> &str {
        Self::MODEL
    }

    fn settings(&self) -> DecodingSettings {
        DecodingSettings::default()
    }
}
