use crate::{
    errors::GenerationError,
    types::{AuditEntry, Dialect, ReferenceExample, SchemaDocument},
};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// Read access to the admin-curated generation context.
///
/// The admin side owns the lifecycle of these records; the pipeline only
/// reads active ones.
#[async_trait]
pub trait Catalog: Send + Sync + DynClone + Debug {
    /// Returns the active schema document for a dialect, if one exists.
    async fn active_schema(
        &self,
        dialect: Dialect,
    ) -> Result<Option<SchemaDocument>, GenerationError>;

    /// Returns active reference examples for a dialect, most recently updated first.
    ///
    /// When `contains` is given, only examples whose title or description
    /// contains it as a substring are returned.
    async fn find_examples(
        &self,
        dialect: Dialect,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ReferenceExample>, GenerationError>;
}

dyn_clone::clone_trait_object!(Catalog);

/// Persistence for generation attempts.
#[async_trait]
pub trait AuditSink: Send + Sync + DynClone + Debug {
    /// Stores one attempt and returns its id.
    async fn record(&self, entry: &AuditEntry) -> Result<String, GenerationError>;

    /// Loads a stored attempt by id.
    async fn audit_entry(&self, id: &str) -> Result<Option<AuditEntry>, GenerationError>;
}

dyn_clone::clone_trait_object!(AuditSink);

/// Plain substring containment against the title or the description.
pub fn example_matches(example: &ReferenceExample, text: &str) -> bool {
    example.title.contains(text)
        || example
            .description
            .as_deref()
            .is_some_and(|d| d.contains(text))
}
