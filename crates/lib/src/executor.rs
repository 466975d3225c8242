//! # The Generation Executor
//!
//! This module defines the `GenerationExecutor`, the entry point the server
//! calls for each request. It fetches the curated context from the catalog,
//! runs the [`SqlGenerator`] and records exactly one audit entry per
//! attempt, successful or not.

use crate::{
    constants::DEFAULT_MAX_EXAMPLES,
    errors::GenerationError,
    generator::SqlGenerator,
    providers::db::storage::{AuditSink, Catalog},
    selector::select_examples,
    types::{
        AuditEntry, Dialect, ExampleRef, GeneratedSql, GenerationReport, GenerationRequest,
        ModelMetadata, ReferenceExample, Requester, SchemaDocument,
    },
};
use tracing::{error, info};

/// Holds everything needed to serve generation requests.
#[derive(Clone, Debug)]
pub struct GenerationExecutor {
    generator: SqlGenerator,
    catalog: Box<dyn Catalog>,
    audit: Box<dyn AuditSink>,
    max_examples: usize,
}

/// The context gathered for one attempt, kept so a failure can still be audited.
#[derive(Default)]
struct Attempt {
    schema: Option<SchemaDocument>,
    examples: Vec<ReferenceExample>,
    prompt: String,
}

impl GenerationExecutor {
    pub fn new(
        generator: SqlGenerator,
        catalog: Box<dyn Catalog>,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        Self {
            generator,
            catalog,
            audit,
            max_examples: DEFAULT_MAX_EXAMPLES,
        }
    }

    /// Sets how many reference examples are placed in each prompt.
    pub fn with_max_examples(mut self, max_examples: usize) -> Self {
        self.max_examples = max_examples;
        self
    }

    pub fn generator(&self) -> &SqlGenerator {
        &self.generator
    }

    /// Generates SQL for one question and records the attempt.
    ///
    /// Invalid input (an empty question or an unknown dialect) is rejected
    /// before anything is recorded. Every later outcome produces one audit
    /// entry; if that write fails, the storage error is returned instead.
    pub async fn execute(
        &self,
        requester: &Requester,
        question: &str,
        dialect: &str,
    ) -> Result<GenerationReport, GenerationError> {
        let dialect: Dialect = dialect.parse()?;
        let request = GenerationRequest::new(question, dialect)?;
        info!(user_id = %requester.user_id, %dialect, question = %request.question(), "Executing SQL generation.");

        let mut attempt = Attempt::default();
        let result = self.run(&request, &mut attempt).await;

        let entry = self.audit_entry(requester, &request, &attempt, &result);
        let audit_id = self.audit.record(&entry).await.inspect_err(|e| {
            error!(error = %e, "Failed to record the audit log entry.");
        })?;

        let outcome = result?;
        Ok(GenerationReport {
            outcome,
            audit_id,
            examples_used: attempt.examples.iter().map(ExampleRef::from).collect(),
            schema_version: attempt.schema.map(|s| s.version),
            prompt: attempt.prompt,
        })
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        attempt: &mut Attempt,
    ) -> Result<GeneratedSql, GenerationError> {
        attempt.schema = self.catalog.active_schema(request.dialect()).await?;
        attempt.examples = select_examples(
            self.catalog.as_ref(),
            request.question(),
            request.dialect(),
            self.max_examples,
        )
        .await?;

        let schema_text = attempt.schema.as_ref().map(|s| s.content.as_str());
        attempt.prompt = self
            .generator
            .render_prompt(request, schema_text, &attempt.examples)?;

        self.generator.generate_from_prompt(&attempt.prompt).await
    }

    fn audit_entry(
        &self,
        requester: &Requester,
        request: &GenerationRequest,
        attempt: &Attempt,
        result: &Result<GeneratedSql, GenerationError>,
    ) -> AuditEntry {
        let (generated_sql, model_metadata, error) = match result {
            Ok(outcome) => (
                Some(outcome.sql.clone()),
                Some(ModelMetadata {
                    model: outcome.model.clone(),
                    temperature: outcome.temperature,
                }),
                None,
            ),
            Err(e) => (None, None, Some(e.to_string())),
        };

        AuditEntry {
            user_id: requester.user_id.clone(),
            user_email: requester.email.clone(),
            role: requester.role.clone(),
            user_question: request.question().to_string(),
            dialect: request.dialect(),
            gold_sql_ids: attempt.examples.iter().map(|e| e.id.clone()).collect(),
            schema_document_id: attempt.schema.as_ref().map(|s| s.id.clone()),
            schema_version: attempt.schema.as_ref().map(|s| s.version.clone()),
            prompt_version: self.generator.prompt_version().to_string(),
            model_metadata,
            generated_sql,
            error,
        }
    }
}
