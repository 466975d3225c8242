//! # SQL Generator
//!
//! Runs the core pipeline for one request: prompt assembly, one call to the
//! generation backend, sanitization and the safety check. It holds no
//! per-request state, so one generator can serve concurrent requests.

use crate::{
    errors::GenerationError,
    prompts::{sql_generation::SQL_GENERATION_SYSTEM_PROMPT, PromptTemplate},
    providers::ai::AiProvider,
    sanitize::sanitize,
    types::{GeneratedSql, GenerationRequest, ReferenceExample},
    validator::SafetyValidator,
};
use std::fmt;
use tracing::{debug, info, warn};

/// Generates validated, read-only SQL from a natural-language question.
#[derive(Clone)]
pub struct SqlGenerator {
    ai_provider: Box<dyn AiProvider>,
    template: PromptTemplate,
    metrics_text: Option<String>,
    validator: SafetyValidator,
}

impl fmt::Debug for SqlGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlGenerator")
            .field("model", &self.ai_provider.model_name())
            .field("prompt_version", &self.template.version())
            .finish_non_exhaustive()
    }
}

/// A builder for creating `SqlGenerator` instances.
///
/// Only the AI provider is required. The built-in template and metric
/// definitions are used unless overridden.
#[derive(Default)]
pub struct SqlGeneratorBuilder {
    ai_provider: Option<Box<dyn AiProvider>>,
    template: Option<PromptTemplate>,
    metrics_text: Option<String>,
}

impl SqlGeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text-generation backend.
    pub fn ai_provider(mut self, provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    /// Overrides the built-in prompt template.
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Overrides the built-in metric definitions block.
    pub fn metrics_text(mut self, metrics_text: impl Into<String>) -> Self {
        self.metrics_text = Some(metrics_text.into());
        self
    }

    /// Builds the `SqlGenerator`.
    pub fn build(self) -> Result<SqlGenerator, GenerationError> {
        let ai_provider = self.ai_provider.ok_or_else(|| {
            GenerationError::MissingAiProvider("no AI provider was given to the generator".into())
        })?;

        Ok(SqlGenerator {
            ai_provider,
            template: self.template.unwrap_or_default(),
            metrics_text: self.metrics_text,
            validator: SafetyValidator::new()?,
        })
    }
}

impl SqlGenerator {
    pub fn builder() -> SqlGeneratorBuilder {
        SqlGeneratorBuilder::new()
    }

    /// The version tag of the template this generator renders.
    pub fn prompt_version(&self) -> &str {
        self.template.version()
    }

    /// The model identifier reported by the backend.
    pub fn model_name(&self) -> &str {
        self.ai_provider.model_name()
    }

    /// Renders the prompt that [`SqlGenerator::generate`] would send.
    pub fn render_prompt(
        &self,
        request: &GenerationRequest,
        schema_text: Option<&str>,
        examples: &[ReferenceExample],
    ) -> Result<String, GenerationError> {
        self.template.build_prompt(
            request,
            schema_text,
            self.metrics_text.as_deref(),
            examples,
        )
    }

    /// Sends an already rendered prompt to the backend and returns the raw text.
    ///
    /// The call is made exactly once.
    pub async fn invoke(&self, prompt: &str) -> Result<String, GenerationError> {
        let raw = self
            .ai_provider
            .generate(SQL_GENERATION_SYSTEM_PROMPT, prompt)
            .await?;
        if raw.trim().is_empty() {
            return Err(GenerationError::Backend(
                "the backend returned an empty completion".to_string(),
            ));
        }
        Ok(raw)
    }

    /// Runs the full pipeline and returns the accepted SQL.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        schema_text: Option<&str>,
        examples: &[ReferenceExample],
    ) -> Result<GeneratedSql, GenerationError> {
        let prompt = self.render_prompt(request, schema_text, examples)?;
        self.generate_from_prompt(&prompt).await
    }

    /// Invokes, sanitizes and validates for a prompt that was already rendered.
    pub async fn generate_from_prompt(&self, prompt: &str) -> Result<GeneratedSql, GenerationError> {
        debug!(prompt = %prompt, "--> Sending prompt to AI provider");

        let raw = self.invoke(prompt).await.inspect_err(|e| {
            warn!(model = %self.model_name(), error = %e, "Generation backend failed.");
        })?;
        debug!("<-- Raw completion: {raw}");

        let sql = sanitize(&raw);
        if let Err(violation) = self.validator.validate(&sql) {
            warn!(reason = %violation, "Generated SQL rejected.");
            return Err(violation.into());
        }

        let settings = self.ai_provider.settings();
        info!(model = %self.model_name(), "Generated SQL accepted.");
        Ok(GeneratedSql {
            sql,
            model: self.model_name().to_string(),
            temperature: settings.temperature,
            prompt_version: self.prompt_version().to_string(),
        })
    }
}
