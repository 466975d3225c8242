//! # AI Provider Factory
//!
//! Builds a boxed [`AiProvider`] from a named provider configuration, so the
//! server and the tests construct backends the same way.

use crate::{
    errors::GenerationError,
    providers::ai::{gemini::GeminiProvider, openai::OpenAiProvider, AiProvider, DecodingSettings},
};
use serde::Deserialize;
use tracing::info;

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// The type of provider ("openai" or "gemini").
    pub provider: String,
    /// The API URL. Optional when it can be derived from the provider type.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which may be absent for local OpenAI-compatible servers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
}

/// Creates an AI provider instance from its configuration.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
    settings: DecodingSettings,
) -> Result<Box<dyn AiProvider>, GenerationError> {
    // Config-file substitution leaves unset variables as empty strings.
    let api_url = config.api_url.clone().filter(|u| !u.is_empty());
    let api_key = config.api_key.clone().filter(|k| !k.is_empty());

    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "openai" => {
            let api_url = api_url.unwrap_or_else(|| OpenAiProvider::DEFAULT_API_URL.to_string());
            info!(provider = %name, api_url = %api_url, model = %config.model_name, "Configuring OpenAI-compatible provider");
            Box::new(OpenAiProvider::new(
                api_url,
                api_key,
                config.model_name.clone(),
                settings,
            )?)
        }
        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                GenerationError::MissingAiProvider(format!(
                    "api_key is required for gemini provider '{name}'"
                ))
            })?;
            let api_url = api_url.unwrap_or_else(|| GeminiProvider::endpoint_for(&config.model_name));
            info!(provider = %name, api_url = %api_url, model = %config.model_name, "Configuring Gemini provider");
            Box::new(GeminiProvider::new(
                api_url,
                api_key,
                config.model_name.clone(),
                settings,
            )?)
        }
        other => {
            return Err(GenerationError::MissingAiProvider(format!(
                "unsupported provider type '{other}' for provider '{name}'"
            )))
        }
    };

    Ok(provider)
}
