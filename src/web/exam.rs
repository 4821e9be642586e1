// src/web/exam.rs
// Exam orchestration handlers. Request/response shapes mirror what the
// browser client sends: topic/difficulty/last_question travel with every
// call, nothing is kept server-side between turns.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::web::state::AppState;

fn opt_str(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

#[derive(Debug, Deserialize)]
pub struct StartExamRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// POST /api/start_exam
pub async fn start_exam(
    State(state): State<AppState>,
    Json(req): Json<StartExamRequest>,
) -> Result<Json<Value>, ApiError> {
    let started = state
        .orchestrator
        .start(opt_str(&req.topic).trim(), opt_str(&req.difficulty))
        .await?;
    Ok(Json(json!({
        "question": started.question,
        "model": started.model,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ExamTurnRequest {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub last_question: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// POST /api/exam_turn
pub async fn exam_turn(
    State(state): State<AppState>,
    Json(req): Json<ExamTurnRequest>,
) -> Result<Json<Value>, ApiError> {
    let turn = state
        .orchestrator
        .turn(
            opt_str(&req.transcript),
            opt_str(&req.last_question),
            opt_str(&req.topic).trim(),
            opt_str(&req.difficulty),
        )
        .await?;
    Ok(Json(json!({
        "feedback": turn.result.feedback,
        "corrected_answer": turn.result.corrected_answer,
        "tip": turn.result.tip,
        "score": turn.result.score,
        "next_question": turn.result.next_question,
        "model": turn.model,
    })))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// POST /api/feedback — plain-text tutor feedback, persisted like a turn.
pub async fn feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Value>, ApiError> {
    let turn = state
        .orchestrator
        .feedback(opt_str(&req.transcript), opt_str(&req.prompt))
        .await?;
    Ok(Json(json!({
        "feedback": turn.result.feedback,
        "model": turn.model,
    })))
}

#[derive(Debug, Deserialize)]
pub struct DictionaryRequest {
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// POST /api/dictionary_ai — decoded-or-fallback dictionary record.
pub async fn dictionary_ai(
    State(state): State<AppState>,
    Json(req): Json<DictionaryRequest>,
) -> Result<Json<crate::exam::DictionaryEntry>, ApiError> {
    let entry = state
        .orchestrator
        .define(opt_str(&req.term), opt_str(&req.difficulty))
        .await?;
    Ok(Json(entry))
}
