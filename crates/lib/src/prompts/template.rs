//! # Prompt Assembly
//!
//! Renders a [`PromptTemplate`] into the string sent to the generation backend.
//! Rendering is a pure function of its inputs: the same request, schema text,
//! metrics text and examples always produce byte-identical output.

use super::sql_generation::{
    DEFAULT_METRICS_TEXT, NO_MATCHING_EXAMPLES, REQUIRED_SLOTS, SCHEMA_NOT_CONFIGURED,
    SLOT_DB_TYPE, SLOT_GOLD_SQL_EXAMPLES, SLOT_METRICS_TEXT, SLOT_SCHEMA_TEXT, SLOT_USER_INPUT,
    SQL_GENERATION_PROMPT,
};
use crate::{
    constants::DEFAULT_PROMPT_VERSION,
    errors::GenerationError,
    types::{GenerationRequest, ReferenceExample},
};
use regex::Regex;

/// Matches a `{SLOT_NAME}` placeholder.
const SLOT_PATTERN: &str = r"\{([A-Z][A-Z0-9_]*)\}";

/// The fully resolved text for each template slot.
///
/// Built by [`PromptSections::resolve`], which applies the sentinel and
/// default substitutions, so no field is ever blank by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSections {
    pub dialect: String,
    pub schema_text: String,
    pub metrics_text: String,
    pub examples: String,
    pub user_input: String,
}

impl PromptSections {
    /// Resolves every section, substituting sentinels for absent context.
    ///
    /// Empty schema or metrics text is treated the same as absent text.
    pub fn resolve(
        request: &GenerationRequest,
        schema_text: Option<&str>,
        metrics_text: Option<&str>,
        examples: &[ReferenceExample],
    ) -> Self {
        let schema_text = schema_text
            .filter(|s| !s.is_empty())
            .unwrap_or(SCHEMA_NOT_CONFIGURED);
        let metrics_text = metrics_text
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_METRICS_TEXT);

        Self {
            dialect: request.dialect().as_str().to_string(),
            schema_text: schema_text.to_string(),
            metrics_text: metrics_text.to_string(),
            examples: render_examples(examples),
            user_input: request.question().to_string(),
        }
    }

    fn get(&self, slot: &str) -> Option<&str> {
        match slot {
            SLOT_DB_TYPE => Some(&self.dialect),
            SLOT_SCHEMA_TEXT => Some(&self.schema_text),
            SLOT_METRICS_TEXT => Some(&self.metrics_text),
            SLOT_GOLD_SQL_EXAMPLES => Some(&self.examples),
            SLOT_USER_INPUT => Some(&self.user_input),
            _ => None,
        }
    }
}

/// A prompt template together with the version tag recorded for audits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
    version: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplate {
    /// The built-in template at its current version.
    pub fn builtin() -> Self {
        Self {
            text: SQL_GENERATION_PROMPT.to_string(),
            version: DEFAULT_PROMPT_VERSION.to_string(),
        }
    }

    /// Creates a custom template.
    ///
    /// Fails if the text is missing any required slot or references a slot
    /// that does not exist.
    pub fn new(
        text: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let text = text.into();
        let re = Regex::new(SLOT_PATTERN)?;
        let found: Vec<&str> = re
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();

        if let Some(unknown) = found.iter().find(|s| !REQUIRED_SLOTS.contains(s)) {
            return Err(GenerationError::Template(format!(
                "unknown slot '{{{unknown}}}'"
            )));
        }
        let missing: Vec<&str> = REQUIRED_SLOTS
            .iter()
            .copied()
            .filter(|slot| !found.contains(slot))
            .collect();
        if !missing.is_empty() {
            return Err(GenerationError::Template(format!(
                "missing slots: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            text,
            version: version.into(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitutes every slot in a single pass.
    ///
    /// Substituted values are never scanned again, so a question or schema
    /// text containing `{USER_INPUT}` is emitted literally.
    pub fn render(&self, sections: &PromptSections) -> Result<String, GenerationError> {
        let re = Regex::new(SLOT_PATTERN)?;
        let mut rendered = String::with_capacity(self.text.len() + sections.schema_text.len());
        let mut last = 0;

        for caps in re.captures_iter(&self.text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = sections.get(name.as_str()).ok_or_else(|| {
                GenerationError::Template(format!("unknown slot '{}'", whole.as_str()))
            })?;
            rendered.push_str(&self.text[last..whole.start()]);
            rendered.push_str(value);
            last = whole.end();
        }
        rendered.push_str(&self.text[last..]);

        Ok(rendered)
    }

    /// Resolves the sections for a request and renders them.
    pub fn build_prompt(
        &self,
        request: &GenerationRequest,
        schema_text: Option<&str>,
        metrics_text: Option<&str>,
        examples: &[ReferenceExample],
    ) -> Result<String, GenerationError> {
        let sections = PromptSections::resolve(request, schema_text, metrics_text, examples);
        self.render(&sections)
    }
}

/// Builds a prompt with the built-in template.
pub fn build_prompt(
    request: &GenerationRequest,
    schema_text: Option<&str>,
    metrics_text: Option<&str>,
    examples: &[ReferenceExample],
) -> Result<String, GenerationError> {
    PromptTemplate::builtin().build_prompt(request, schema_text, metrics_text, examples)
}

/// Renders reference examples into the gold SQL section of the prompt.
///
/// Each example gets a numbered header, an optional purpose line, its tag
/// list (an empty list still renders the label) and the raw SQL. Examples are
/// separated by a blank line. With no examples the sentinel sentence is used.
pub fn render_examples(examples: &[ReferenceExample]) -> String {
    if examples.is_empty() {
        return NO_MATCHING_EXAMPLES.to_string();
    }

    examples
        .iter()
        .enumerate()
        .map(|(i, example)| {
            let purpose = example
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(|d| format!("用途: {d}\n"))
                .unwrap_or_default();
            format!(
                "--- ゴールドSQL {}: {} ---\n{}タグ: {}\n{}",
                i + 1,
                example.title,
                purpose,
                example.tags.join(", "),
                example.sql
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
