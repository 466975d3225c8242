//! # Core Value Types
//!
//! The values that flow through the generation pipeline. Every stage receives
//! these by reference and produces a new value; nothing here is mutated once
//! it has been handed to the next stage.

use crate::errors::GenerationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The target database dialects a query can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Mysql,
    Bigquery,
    Postgres,
}

impl Dialect {
    /// All supported dialects, in display order.
    pub const ALL: [Dialect; 3] = [Dialect::Mysql, Dialect::Bigquery, Dialect::Postgres];

    /// The canonical lowercase name, used both in the prompt and in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Bigquery => "bigquery",
            Dialect::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| GenerationError::UnsupportedDialect(s.to_string()))
    }
}

/// A single end-user submission. Only constructible with a non-empty question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    question: String,
    dialect: Dialect,
}

impl GenerationRequest {
    pub fn new(question: impl Into<String>, dialect: Dialect) -> Result<Self, GenerationError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(GenerationError::EmptyQuestion);
        }
        Ok(Self { question, dialect })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

/// Admin-curated schema documentation for one dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub id: String,
    pub dialect: Dialect,
    pub content: String,
    pub version: String,
    pub is_active: bool,
}

/// A known-correct reference query ("gold SQL").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceExample {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub dialect: Dialect,
    pub sql: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// The successful result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSql {
    pub sql: String,
    pub model: String,
    pub temperature: f32,
    pub prompt_version: String,
}

/// The identity of whoever submitted a request, as asserted by the upstream
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl Requester {
    /// The identity used when no upstream identity is supplied.
    pub fn guest() -> Self {
        Self {
            user_id: crate::constants::GUEST_USER_ID.to_string(),
            email: String::new(),
            role: "member".to_string(),
        }
    }
}

/// One persisted generation attempt, successful or not.
///
/// Exactly one of `generated_sql` and `error` is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: String,
    pub user_email: String,
    pub role: String,
    pub user_question: String,
    pub dialect: Dialect,
    pub gold_sql_ids: Vec<String>,
    pub schema_document_id: Option<String>,
    pub schema_version: Option<String>,
    pub prompt_version: String,
    pub model_metadata: Option<ModelMetadata>,
    pub generated_sql: Option<String>,
    pub error: Option<String>,
}

/// The backend settings that produced a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model: String,
    pub temperature: f32,
}

/// The id and title of a reference example that was placed in the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRef {
    pub id: String,
    pub title: String,
}

impl From<&ReferenceExample> for ExampleRef {
    fn from(example: &ReferenceExample) -> Self {
        Self {
            id: example.id.clone(),
            title: example.title.clone(),
        }
    }
}

/// What the executor hands back after a successful, audited generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub outcome: GeneratedSql,
    pub audit_id: String,
    pub examples_used: Vec<ExampleRef>,
    pub schema_version: Option<String>,
    /// The exact prompt sent to the backend.
    pub prompt: String,
}
