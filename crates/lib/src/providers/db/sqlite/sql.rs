//! # SQLite Specific SQL Queries
//!
//! This module centralizes SQL query strings for the SQLite provider.

pub const CREATE_SCHEMA_DOCUMENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS schema_documents (
        id TEXT PRIMARY KEY,
        dialect TEXT NOT NULL,
        version TEXT NOT NULL,
        content TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

pub const CREATE_GOLD_SQLS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS gold_sqls (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        dialect TEXT NOT NULL,
        sql TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

pub const CREATE_GOLD_SQLS_DIALECT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_gold_sqls_dialect ON gold_sqls (dialect, is_active);";

pub const CREATE_AUDIT_LOGS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS audit_logs (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        user_email TEXT NOT NULL,
        role TEXT NOT NULL,
        user_question TEXT NOT NULL,
        dialect TEXT NOT NULL,
        gold_sql_ids TEXT NOT NULL,
        schema_document_id TEXT,
        schema_version TEXT,
        prompt_version TEXT NOT NULL,
        model_metadata TEXT,
        generated_sql TEXT,
        error TEXT,
        created_at TEXT NOT NULL
    );
";

/// Every statement needed to create the application tables, in order.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_SCHEMA_DOCUMENTS_TABLE,
    CREATE_GOLD_SQLS_TABLE,
    CREATE_GOLD_SQLS_DIALECT_INDEX,
    CREATE_AUDIT_LOGS_TABLE,
];

pub const SELECT_ACTIVE_SCHEMA: &str = "
    SELECT id, dialect, version, content, is_active
    FROM schema_documents
    WHERE dialect = ? AND is_active = 1
    ORDER BY updated_at DESC
    LIMIT 1;
";

pub const DEACTIVATE_SCHEMAS_FOR_DIALECT: &str =
    "UPDATE schema_documents SET is_active = 0 WHERE dialect = ? AND is_active = 1;";

pub const INSERT_SCHEMA_DOCUMENT: &str = "
    INSERT INTO schema_documents (id, dialect, version, content, is_active, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?);
";

pub const INSERT_GOLD_SQL: &str = "
    INSERT INTO gold_sqls (id, title, description, dialect, sql, tags, is_active, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
";

/// Returns the query that lists active gold SQL rows for a dialect.
///
/// Parameters: the dialect, then (with `with_text_match`) the search text
/// twice, matched as a plain substring of the title and of the description.
/// Ties on `updated_at` are broken by id so the order is stable.
/// `instr` is used rather than `LIKE` so that `%` and `_` in the question
/// carry no special meaning.
pub fn select_gold_sqls(with_text_match: bool, limit: usize) -> String {
    let text_filter = if with_text_match {
        "AND (instr(title, ?) > 0 OR instr(COALESCE(description, ''), ?) > 0)"
    } else {
        ""
    };
    format!(
        "
        SELECT id, title, description, dialect, sql, tags, is_active, updated_at
        FROM gold_sqls
        WHERE dialect = ? AND is_active = 1 {text_filter}
        ORDER BY updated_at DESC, id ASC
        LIMIT {limit};
    "
    )
}

pub const INSERT_AUDIT_LOG: &str = "
    INSERT INTO audit_logs (
        id, user_id, user_email, role, user_question, dialect, gold_sql_ids,
        schema_document_id, schema_version, prompt_version, model_metadata,
        generated_sql, error, created_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
";

pub const SELECT_AUDIT_LOG: &str = "
    SELECT user_id, user_email, role, user_question, dialect, gold_sql_ids,
           schema_document_id, schema_version, prompt_version, model_metadata,
           generated_sql, error
    FROM audit_logs
    WHERE id = ?;
";
