//! # In-Memory Catalog
//!
//! A [`Catalog`] and [`AuditSink`] kept entirely in process. Clones share the
//! same underlying data.

use super::storage::{example_matches, AuditSink, Catalog};
use crate::{
    errors::GenerationError,
    types::{AuditEntry, Dialect, ReferenceExample, SchemaDocument},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    schemas: Vec<SchemaDocument>,
    examples: Vec<ReferenceExample>,
    audit_log: Vec<(String, AuditEntry)>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema document. Adding an active document deactivates every
    /// other document of the same dialect.
    pub async fn add_schema(&self, schema: SchemaDocument) {
        let mut state = self.state.write().await;
        if schema.is_active {
            state
                .schemas
                .iter_mut()
                .filter(|s| s.dialect == schema.dialect)
                .for_each(|s| s.is_active = false);
        }
        state.schemas.push(schema);
    }

    pub async fn add_example(&self, example: ReferenceExample) {
        self.state.write().await.examples.push(example);
    }

    /// All recorded attempts, oldest first.
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state
            .read()
            .await
            .audit_log
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn active_schema(
        &self,
        dialect: Dialect,
    ) -> Result<Option<SchemaDocument>, GenerationError> {
        let state = self.state.read().await;
        Ok(state
            .schemas
            .iter()
            .find(|s| s.dialect == dialect && s.is_active)
            .cloned())
    }

    async fn find_examples(
        &self,
        dialect: Dialect,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ReferenceExample>, GenerationError> {
        let state = self.state.read().await;
        let mut examples: Vec<ReferenceExample> = state
            .examples
            .iter()
            .filter(|e| e.is_active && e.dialect == dialect)
            .filter(|e| contains.is_none_or(|text| example_matches(e, text)))
            .cloned()
            .collect();
        examples.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        examples.truncate(limit);
        Ok(examples)
    }
}

#[async_trait]
impl AuditSink for MemoryCatalog {
    async fn record(&self, entry: &AuditEntry) -> Result<String, GenerationError> {
        let id = Uuid::new_v4().to_string();
        self.state
            .write()
            .await
            .audit_log
            .push((id.clone(), entry.clone()));
        Ok(id)
    }

    async fn audit_entry(&self, id: &str) -> Result<Option<AuditEntry>, GenerationError> {
        Ok(self
            .state
            .read()
            .await
            .audit_log
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, entry)| entry.clone()))
    }
}
