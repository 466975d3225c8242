//! # Natural Language to Read-Only SQL
//!
//! This crate turns a natural-language question into a read-only SQL query
//! for a chosen database dialect. It assembles a deterministic prompt from
//! admin-curated context (schema documentation, metric definitions and
//! "gold" reference queries), calls a text-generation backend, strips any
//! code fences from the answer and rejects anything that is not a plain
//! SELECT before the attempt is recorded in an audit log.

pub mod constants;
pub mod errors;
pub mod executor;
pub mod generator;
pub mod prompts;
pub mod providers;
pub mod rate_limit;
pub mod sanitize;
pub mod selector;
pub mod types;
pub mod validator;

pub use errors::{GenerationError, PolicyViolation};
pub use executor::GenerationExecutor;
pub use generator::{SqlGenerator, SqlGeneratorBuilder};
pub use prompts::{build_prompt, PromptTemplate};
pub use rate_limit::{FixedWindowRateLimiter, RateLimitDecision, RateLimiter};
pub use sanitize::sanitize;
pub use selector::select_examples;
pub use types::{
    AuditEntry, Dialect, ExampleRef, GeneratedSql, GenerationReport, GenerationRequest,
    ModelMetadata, ReferenceExample, Requester, SchemaDocument,
};
pub use validator::SafetyValidator;
