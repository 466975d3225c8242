//! # Generation Route Handlers
//!
//! This module contains the handler that turns a natural-language question
//! into a validated, read-only SQL query.

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::auth::middleware::RequesterIdentity;
use axum::{
    extract::{Query, State},
    Json,
};
use goldsql::ExampleRef;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

// --- API Payloads for Generation Handlers ---

/// Both fields are optional here so a missing one is reported as a
/// `400 Bad Request` with a readable message instead of axum's default rejection.
#[derive(Deserialize, Debug, Default)]
pub struct GenerateRequest {
    pub question: Option<String>,
    pub db_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub sql: String,
    pub model: String,
    pub temperature: f32,
    pub prompt_version: String,
    pub audit_log_id: String,
    pub gold_sqls_used: Vec<ExampleRef>,
    pub schema_version: Option<String>,
}

// --- Generation Handlers ---

/// Handler for the SQL generation endpoint.
///
/// The request is counted against the caller's quota before anything else
/// happens. The executor then records one audit entry for the attempt,
/// whether the query is accepted or rejected.
pub async fn generate_sql_handler(
    State(app_state): State<AppState>,
    RequesterIdentity(requester): RequesterIdentity,
    debug_params: Query<DebugParams>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponse>>, AppError> {
    let (Some(question), Some(db_type)) = (payload.question, payload.db_type) else {
        return Err(AppError::BadRequest(
            "Both 'question' and 'db_type' are required.".to_string(),
        ));
    };

    let decision = app_state
        .rate_limiter
        .check(&format!("generate:{}", requester.user_id));
    if !decision.allowed {
        warn!(user_id = %requester.user_id, "Generation request throttled.");
        return Err(AppError::RateLimited);
    }

    info!(
        user_id = %requester.user_id,
        db_type = %db_type,
        remaining = decision.remaining,
        "Received SQL generation request."
    );

    let report = app_state
        .executor
        .execute(&requester, &question, &db_type)
        .await?;

    let debug_info = json!({ "prompt": report.prompt });
    let response = GenerateResponse {
        sql: report.outcome.sql,
        model: report.outcome.model,
        temperature: report.outcome.temperature,
        prompt_version: report.outcome.prompt_version,
        audit_log_id: report.audit_id,
        gold_sqls_used: report.examples_used,
        schema_version: report.schema_version,
    };

    Ok(wrap_response(response, debug_params, Some(debug_info)))
}
