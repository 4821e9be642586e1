// src/web/logs.rs
// Health/db-check/audit endpoints plus CRUD for the analysis_logs table.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::store::{AnalysisLog, LogPatch, ScoreSet};
use crate::web::state::AppState;

fn log_json(row: &AnalysisLog) -> Value {
    json!({
        "id": row.id,
        "input_text": row.input_text,
        "feedback_text": row.feedback_text,
        "model_name": row.model_name,
        "scores": {
            "overall": row.score_overall,
            "grammar": row.score_grammar,
            "fluency": row.score_fluency,
            "pronunciation": row.score_pronunciation,
        },
        "created_at": row.created_at.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
    })
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /db-check — proves the database is reachable.
pub async fn db_check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let count = state.logs.count().await?;
    Ok(Json(json!({ "analysis_logs_count": count })))
}

/// GET /audit — the raw audit file as text/plain.
pub async fn audit_view(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .audit
        .read_all()
        .await
        .unwrap_or_else(|| "No audit entries yet.\n".to_string());
    ([("content-type", "text/plain; charset=utf-8")], body)
}

/// POST /audit/clear
pub async fn audit_clear(State(state): State<AppState>) -> impl IntoResponse {
    state.audit.clear().await;
    Json(json!({ "status": "cleared" }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// GET /api/logs?page=&per_page= — newest first.
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(10).clamp(1, 100);

    let result = state.logs.list(page, per_page).await?;
    Ok(Json(json!({
        "page": result.page,
        "per_page": result.per_page,
        "total": result.total,
        "items": result.items.iter().map(log_json).collect::<Vec<_>>(),
    })))
}

/// GET /api/logs/{id}
pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let row = state.logs.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(log_json(&row)))
}

#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    #[serde(default)]
    pub input_text: Option<String>,
    #[serde(default)]
    pub feedback_text: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub scores: Option<ScoreSet>,
}

/// POST /api/logs — manual record creation.
pub async fn create_log(
    State(state): State<AppState>,
    Json(req): Json<CreateLogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input_text = req.input_text.as_deref().unwrap_or("").trim().to_string();
    let feedback_text = req.feedback_text.as_deref().unwrap_or("").trim().to_string();
    if input_text.is_empty() || feedback_text.is_empty() {
        return Err(ApiError::Validation(
            "input_text and feedback_text are required".into(),
        ));
    }
    let model_name = match req.model_name.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => "manual".to_string(),
    };

    let row = state
        .logs
        .create(
            &input_text,
            &feedback_text,
            &model_name,
            req.scores.unwrap_or_default(),
        )
        .await?;

    state
        .audit
        .record(
            "CREATE",
            &[
                ("id", row.id.to_string()),
                ("model", row.model_name.clone()),
                ("input_chars", row.input_text.len().to_string()),
            ],
        )
        .await;

    Ok((StatusCode::CREATED, Json(log_json(&row))))
}

/// PUT /api/logs/{id} — change any fields present in the body.
pub async fn update_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<LogPatch>,
) -> Result<Json<Value>, ApiError> {
    let row = state
        .logs
        .update(id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;

    state
        .audit
        .record(
            "UPDATE",
            &[("id", row.id.to_string()), ("model", row.model_name.clone())],
        )
        .await;

    Ok(Json(log_json(&row)))
}

/// DELETE /api/logs/{id}
pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if !state.logs.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    state.audit.record("DELETE", &[("id", id.to_string())]).await;
    Ok(Json(json!({ "deleted": id })))
}
