use super::storage::{AuditSink, Catalog};
use crate::{
    errors::GenerationError,
    types::{AuditEntry, Dialect, ModelMetadata, ReferenceExample, SchemaDocument},
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::{self, Debug};
use tracing::{debug, info, warn};
use turso::{Connection, Database, Row, Value as TursoValue};
use uuid::Uuid;

pub mod sql;

/// A provider for the application's own SQLite database using Turso.
///
/// It stores schema documents, gold SQL examples and the audit log. Cloning
/// shares the same underlying database, so an in-memory instance can be
/// shared by cloning it.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path, or `":memory:"` for an
    /// isolated in-memory database.
    pub async fn new(db_path: &str) -> Result<Self, GenerationError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| GenerationError::StorageConnection(e.to_string()))?;

        // WAL has no effect on in-memory databases but is safe to run.
        let conn = db
            .connect()
            .map_err(|e| GenerationError::StorageConnection(e.to_string()))?;
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| GenerationError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    fn connect(&self) -> Result<Connection, GenerationError> {
        self.db
            .connect()
            .map_err(|e| GenerationError::StorageConnection(e.to_string()))
    }

    /// Ensures that all required application tables and indexes exist.
    /// This function is idempotent and safe to call on every application startup.
    pub async fn initialize_schema(&self) -> Result<(), GenerationError> {
        let conn = self.connect()?;
        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }
        Ok(())
    }

    /// Stores a schema document. When `activate` is set, every other document
    /// of the same dialect is deactivated first, so at most one is active.
    pub async fn save_schema_document(
        &self,
        dialect: Dialect,
        version: &str,
        content: &str,
        activate: bool,
    ) -> Result<SchemaDocument, GenerationError> {
        let conn = self.connect()?;
        let id = Uuid::new_v4().to_string();

        let now = timestamp(Utc::now());
        let insert_params = vec![
            TursoValue::Text(id.clone()),
            TursoValue::Text(dialect.as_str().to_string()),
            TursoValue::Text(version.to_string()),
            TursoValue::Text(content.to_string()),
            TursoValue::Integer(activate.into()),
            TursoValue::Text(now.clone()),
            TursoValue::Text(now),
        ];

        conn.execute("BEGIN TRANSACTION", ()).await?;
        if activate {
            let deactivated = conn
                .execute(
                    sql::DEACTIVATE_SCHEMAS_FOR_DIALECT,
                    vec![TursoValue::Text(dialect.as_str().to_string())],
                )
                .await;
            if let Err(e) = deactivated {
                warn!("Failed to deactivate schema documents: {e:?}. Rolling back transaction.");
                conn.execute("ROLLBACK", ()).await?;
                return Err(e.into());
            }
        }
        if let Err(e) = conn.execute(sql::INSERT_SCHEMA_DOCUMENT, insert_params).await {
            warn!("Failed to insert schema document: {e:?}. Rolling back transaction.");
            conn.execute("ROLLBACK", ()).await?;
            return Err(e.into());
        }
        conn.execute("COMMIT", ()).await?;

        info!(%dialect, %version, activate, "Saved schema document.");
        Ok(SchemaDocument {
            id,
            dialect,
            content: content.to_string(),
            version: version.to_string(),
            is_active: activate,
        })
    }

    /// Stores a gold SQL example as given, including its id and `updated_at`.
    pub async fn save_gold_sql(&self, example: &ReferenceExample) -> Result<(), GenerationError> {
        let conn = self.connect()?;
        let updated_at = timestamp(example.updated_at);
        conn.execute(
            sql::INSERT_GOLD_SQL,
            vec![
                TursoValue::Text(example.id.clone()),
                TursoValue::Text(example.title.clone()),
                optional_text(example.description.clone()),
                TursoValue::Text(example.dialect.as_str().to_string()),
                TursoValue::Text(example.sql.clone()),
                TursoValue::Text(serde_json::to_string(&example.tags)?),
                TursoValue::Integer(example.is_active.into()),
                TursoValue::Text(updated_at.clone()),
                TursoValue::Text(updated_at),
            ],
        )
        .await?;
        Ok(())
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

impl AsRef<Database> for SqliteProvider {
    fn as_ref(&self) -> &Database {
        &self.db
    }
}

/// Fixed-width UTC timestamps, so text ordering matches time ordering.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn optional_text(value: Option<String>) -> TursoValue {
    value.map(TursoValue::Text).unwrap_or(TursoValue::Null)
}

fn text_at(row: &Row, index: usize) -> Result<String, GenerationError> {
    match row.get_value(index)? {
        TursoValue::Text(s) => Ok(s),
        other => Err(GenerationError::StorageOperationFailed(format!(
            "expected text in column {index}, found {other:?}"
        ))),
    }
}

fn optional_text_at(row: &Row, index: usize) -> Result<Option<String>, GenerationError> {
    match row.get_value(index)? {
        TursoValue::Null => Ok(None),
        TursoValue::Text(s) => Ok(Some(s)),
        other => Err(GenerationError::StorageOperationFailed(format!(
            "expected text or null in column {index}, found {other:?}"
        ))),
    }
}

fn bool_at(row: &Row, index: usize) -> Result<bool, GenerationError> {
    match row.get_value(index)? {
        TursoValue::Integer(i) => Ok(i != 0),
        other => Err(GenerationError::StorageOperationFailed(format!(
            "expected integer in column {index}, found {other:?}"
        ))),
    }
}

fn dialect_at(row: &Row, index: usize) -> Result<Dialect, GenerationError> {
    text_at(row, index)?.parse()
}

fn example_from_row(row: &Row) -> Result<ReferenceExample, GenerationError> {
    let updated_at = text_at(row, 7)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| GenerationError::StorageOperationFailed(e.to_string()))?
        .with_timezone(&Utc);
    // Tags that are not a JSON array of strings are treated as no tags.
    let tags = serde_json::from_str(&text_at(row, 5)?).unwrap_or_default();

    Ok(ReferenceExample {
        id: text_at(row, 0)?,
        title: text_at(row, 1)?,
        description: optional_text_at(row, 2)?,
        dialect: dialect_at(row, 3)?,
        sql: text_at(row, 4)?,
        tags,
        is_active: bool_at(row, 6)?,
        updated_at,
    })
}

#[async_trait]
impl Catalog for SqliteProvider {
    async fn active_schema(
        &self,
        dialect: Dialect,
    ) -> Result<Option<SchemaDocument>, GenerationError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                sql::SELECT_ACTIVE_SCHEMA,
                vec![TursoValue::Text(dialect.as_str().to_string())],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            debug!(%dialect, "No active schema document.");
            return Ok(None);
        };

        Ok(Some(SchemaDocument {
            id: text_at(&row, 0)?,
            dialect: dialect_at(&row, 1)?,
            version: text_at(&row, 2)?,
            content: text_at(&row, 3)?,
            is_active: bool_at(&row, 4)?,
        }))
    }

    async fn find_examples(
        &self,
        dialect: Dialect,
        contains: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ReferenceExample>, GenerationError> {
        let conn = self.connect()?;
        let mut params = vec![TursoValue::Text(dialect.as_str().to_string())];
        if let Some(text) = contains {
            params.push(TursoValue::Text(text.to_string()));
            params.push(TursoValue::Text(text.to_string()));
        }

        let query = sql::select_gold_sqls(contains.is_some(), limit);
        let mut rows = conn.query(&query, params).await?;

        let mut examples = Vec::new();
        while let Some(row) = rows.next().await? {
            examples.push(example_from_row(&row)?);
        }
        debug!(%dialect, text_match = contains.is_some(), found = examples.len(), "Fetched gold SQL examples.");
        Ok(examples)
    }
}

#[async_trait]
impl AuditSink for SqliteProvider {
    async fn record(&self, entry: &AuditEntry) -> Result<String, GenerationError> {
        let conn = self.connect()?;
        let id = Uuid::new_v4().to_string();
        let model_metadata = entry
            .model_metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            sql::INSERT_AUDIT_LOG,
            vec![
                TursoValue::Text(id.clone()),
                TursoValue::Text(entry.user_id.clone()),
                TursoValue::Text(entry.user_email.clone()),
                TursoValue::Text(entry.role.clone()),
                TursoValue::Text(entry.user_question.clone()),
                TursoValue::Text(entry.dialect.as_str().to_string()),
                TursoValue::Text(serde_json::to_string(&entry.gold_sql_ids)?),
                optional_text(entry.schema_document_id.clone()),
                optional_text(entry.schema_version.clone()),
                TursoValue::Text(entry.prompt_version.clone()),
                optional_text(model_metadata),
                optional_text(entry.generated_sql.clone()),
                optional_text(entry.error.clone()),
                TursoValue::Text(timestamp(Utc::now())),
            ],
        )
        .await?;

        debug!(audit_id = %id, "Recorded audit log entry.");
        Ok(id)
    }

    async fn audit_entry(&self, id: &str) -> Result<Option<AuditEntry>, GenerationError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(sql::SELECT_AUDIT_LOG, vec![TursoValue::Text(id.to_string())])
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let model_metadata: Option<ModelMetadata> = optional_text_at(&row, 9)?
            .map(|json| serde_json::from_str(&json))
            .transpose()?;

        Ok(Some(AuditEntry {
            user_id: text_at(&row, 0)?,
            user_email: text_at(&row, 1)?,
            role: text_at(&row, 2)?,
            user_question: text_at(&row, 3)?,
            dialect: dialect_at(&row, 4)?,
            gold_sql_ids: serde_json::from_str(&text_at(&row, 5)?)?,
            schema_document_id: optional_text_at(&row, 6)?,
            schema_version: optional_text_at(&row, 7)?,
            prompt_version: text_at(&row, 8)?,
            model_metadata,
            generated_sql: optional_text_at(&row, 10)?,
            error: optional_text_at(&row, 11)?,
        }))
    }
}
