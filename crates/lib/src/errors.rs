use thiserror::Error;

/// The reason a generated query was refused by the safety validator.
///
/// The `Display` form is the reason string that is reported to the caller
/// and persisted alongside the failed attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("forbidden SQL operation detected: {0}")]
    ForbiddenKeyword(&'static str),
    #[error("generated SQL does not contain a SELECT statement")]
    MissingSelect,
}

/// Custom error types for the application.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The text-generation backend failed, returned an error, or returned nothing.
    #[error("Generation backend error: {0}")]
    Backend(String),
    /// The sanitized output was rejected by the safety validator.
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error("The question must not be empty")]
    EmptyQuestion,
    #[error("Unsupported database dialect: '{0}'")]
    UnsupportedDialect(String),
    #[error("Prompt template error: {0}")]
    Template(String),
    #[error("AI provider is not configured: {0}")]
    MissingAiProvider(String),
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Storage provider connection error: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl GenerationError {
    /// Returns `true` if the error came from the generation backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, GenerationError::Backend(_))
    }

    /// Returns `true` if the error is a rejection by the safety validator.
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, GenerationError::Policy(_))
    }
}

impl From<turso::Error> for GenerationError {
    fn from(err: turso::Error) -> Self {
        GenerationError::StorageOperationFailed(err.to_string())
    }
}
