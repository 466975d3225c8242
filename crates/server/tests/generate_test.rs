//! # Generation Endpoint Tests
//!
//! Drives `POST /generate` end to end: a real router, a temporary SQLite
//! database and an `httpmock` stand-in for the OpenAI-compatible backend.

mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use common::{completion_body, TestApp, COMPLETIONS_PATH, MOCK_MODEL};
use goldsql::prompts::sql_generation::{NO_MATCHING_EXAMPLES, SCHEMA_NOT_CONFIGURED};
use goldsql::providers::db::storage::AuditSink;
use goldsql::{Dialect, ReferenceExample};
use httpmock::Method::POST;
use reqwest::StatusCode;
use serde_json::{json, Value};

const LTV_QUESTION: &str = "2025年に登録した25歳以上のユーザーの平均LTVを教えて";
const LTV_SQL: &str = "SELECT AVG(ltv) FROM users WHERE YEAR(created_at) = 2025";

async fn seed_ltv_context(app: &TestApp) -> Result<()> {
    let provider = &app.app_state.sqlite_provider;
    provider
        .save_schema_document(Dialect::Mysql, "v3", "users(id, age, ltv, created_at)", true)
        .await?;
    provider
        .save_gold_sql(&ReferenceExample {
            id: "gold-ltv".to_string(),
            title: "LTV calculation".to_string(),
            description: Some("年ごとの平均LTV".to_string()),
            dialect: Dialect::Mysql,
            sql: LTV_SQL.to_string(),
            tags: vec!["LTV".to_string()],
            is_active: true,
            updated_at: Utc::now() - Duration::minutes(5),
        })
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_generate_returns_validated_sql() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_ltv_context(&app).await?;

    let mock = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(COMPLETIONS_PATH)
            .body_contains(LTV_SQL)
            .body_contains("users(id, age, ltv, created_at)");
        then.status(200).json_body(completion_body(
            "```sql\nSELECT AVG(ltv) FROM users WHERE age >= 25\n```",
        ));
    });

    let response = app.generate(LTV_QUESTION, "mysql").await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    mock.assert();

    let result = &body["result"];
    assert_eq!(result["sql"], "SELECT AVG(ltv) FROM users WHERE age >= 25");
    assert_eq!(result["model"], MOCK_MODEL);
    assert_eq!(result["temperature"], 0.0);
    assert_eq!(result["prompt_version"], "v1.0");
    assert_eq!(result["schema_version"], "v3");
    assert_eq!(
        result["gold_sqls_used"],
        json!([{"id": "gold-ltv", "title": "LTV calculation"}])
    );
    assert!(body.get("debug").is_none());

    let audit_id = result["audit_log_id"].as_str().unwrap();
    let entry = app
        .app_state
        .sqlite_provider
        .audit_entry(audit_id)
        .await?
        .expect("audit entry should exist");
    assert_eq!(entry.user_id, "guest");
    assert_eq!(entry.user_question, LTV_QUESTION);
    assert_eq!(entry.gold_sql_ids, vec!["gold-ltv".to_string()]);
    assert_eq!(entry.schema_version.as_deref(), Some("v3"));
    assert_eq!(
        entry.generated_sql.as_deref(),
        Some("SELECT AVG(ltv) FROM users WHERE age >= 25")
    );
    assert!(entry.error.is_none());
    Ok(())
}

#[tokio::test]
async fn test_generate_without_context_still_calls_backend() -> Result<()> {
    let app = TestApp::spawn().await?;

    let mock = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(COMPLETIONS_PATH)
            .body_contains(NO_MATCHING_EXAMPLES)
            .body_contains(SCHEMA_NOT_CONFIGURED);
        then.status(200)
            .json_body(completion_body("SELECT COUNT(*) FROM events"));
    });

    let response = app.generate("イベント数を教えて", "bigquery").await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    mock.assert();
    assert_eq!(body["result"]["sql"], "SELECT COUNT(*) FROM events");
    assert_eq!(body["result"]["gold_sqls_used"], json!([]));
    assert!(body["result"]["schema_version"].is_null());
    Ok(())
}

#[tokio::test]
async fn test_debug_param_returns_rendered_prompt() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_ltv_context(&app).await?;
    app.mock_server.mock(|when, then| {
        when.method(POST).path(COMPLETIONS_PATH);
        then.status(200).json_body(completion_body("SELECT 1"));
    });

    let response = app
        .client
        .post(format!("{}/generate?debug=true", app.address))
        .json(&json!({ "question": LTV_QUESTION, "db_type": "mysql" }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let prompt = body["debug"]["prompt"].as_str().unwrap();
    assert!(prompt.contains(LTV_QUESTION));
    assert!(prompt.contains(LTV_SQL));
    assert!(prompt.contains("mysql"));
    Ok(())
}

#[tokio::test]
async fn test_forbidden_sql_is_rejected_with_422() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_server.mock(|when, then| {
        when.method(POST).path(COMPLETIONS_PATH);
        then.status(200)
            .json_body(completion_body("DROP TABLE users; SELECT 1"));
    });

    let response = app.generate("ユーザーを全部消して", "mysql").await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "forbidden SQL operation detected: DROP");
    Ok(())
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_the_backend() -> Result<()> {
    let app = TestApp::spawn().await?;
    let mock = app.mock_server.mock(|when, then| {
        when.method(POST).path(COMPLETIONS_PATH);
        then.status(200).json_body(completion_body("SELECT 1"));
    });

    let unsupported = app.generate("ユーザー数", "oracle").await?;
    assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);
    let body: Value = unsupported.json().await?;
    assert_eq!(body["error"], "Unsupported database dialect: 'oracle'");

    let blank = app.generate("   ", "mysql").await?;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let missing = app
        .client
        .post(format!("{}/generate", app.address))
        .json(&json!({ "question": "ユーザー数" }))
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body: Value = missing.json().await?;
    assert_eq!(body["error"], "Both 'question' and 'db_type' are required.");

    mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_backend_failure_maps_to_502() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_server.mock(|when, then| {
        when.method(POST).path(COMPLETIONS_PATH);
        then.status(500).body("upstream exploded");
    });

    let response = app.generate("ユーザー数", "postgres").await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await?;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Generation backend error"));
    Ok(())
}

#[tokio::test]
async fn test_identity_headers_are_audited() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_server.mock(|when, then| {
        when.method(POST).path(COMPLETIONS_PATH);
        then.status(200).json_body(completion_body("SELECT 1"));
    });

    let response = app
        .client
        .post(format!("{}/generate", app.address))
        .header("x-user-id", "u-42")
        .header("x-user-email", "analyst@example.com")
        .header("x-user-role", "admin")
        .json(&json!({ "question": "ユーザー数", "db_type": "mysql" }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let audit_id = body["result"]["audit_log_id"].as_str().unwrap();
    let entry = app
        .app_state
        .sqlite_provider
        .audit_entry(audit_id)
        .await?
        .expect("audit entry should exist");
    assert_eq!(entry.user_id, "u-42");
    assert_eq!(entry.user_email, "analyst@example.com");
    assert_eq!(entry.role, "admin");
    Ok(())
}

#[tokio::test]
async fn test_health_and_root() -> Result<()> {
    let app = TestApp::spawn().await?;

    let health = app.client.get(format!("{}/health", app.address)).send().await?;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await?, "OK");

    let root = app.client.get(&app.address).send().await?;
    assert_eq!(root.text().await?, "goldsql server is running.");
    Ok(())
}
