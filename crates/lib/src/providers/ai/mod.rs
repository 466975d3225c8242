pub mod gemini;
pub mod openai;

use crate::{
    constants::{DEFAULT_MAX_OUTPUT_TOKENS, GENERATION_TEMPERATURE},
    errors::GenerationError,
};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// Fixed decoding parameters sent with every generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for DecodingSettings {
    fn default() -> Self {
        Self {
            temperature: GENERATION_TEMPERATURE,
            max_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// A trait for interacting with a text-generation backend.
///
/// Implementations send one system instruction and one user prompt and return
/// the raw completion text. They never retry: a failed call is reported as
/// [`GenerationError::Backend`] and retrying is left to the caller.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, GenerationError>;

    /// The model identifier recorded with each generated query.
    fn model_name(&self) -> &str;

    /// The decoding parameters this provider sends.
    fn settings(&self) -> DecodingSettings;
}

dyn_clone::clone_trait_object!(AiProvider);

/// Rejects a completion that contains no usable text.
pub(crate) fn non_empty_completion(text: Option<String>) -> Result<String, GenerationError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(GenerationError::Backend(
            "the backend returned an empty completion".to_string(),
        )),
    }
}
