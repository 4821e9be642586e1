// src/web/stream.rs
// Free-form answer endpoints: non-streaming JSON and the SSE token relay.
//
// The relay consumes the gateway stream inside the response body itself
// rather than via a spawned task, so a client disconnect drops the whole
// chain and stops upstream consumption.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::StreamExt;
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;

use crate::error::ApiError;
use crate::llm::{CompletionOptions, StreamEvent};
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
}

/// POST /api/answer — non-streaming fallback.
pub async fn answer_plain(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<Value>, ApiError> {
    let text = state
        .orchestrator
        .answer(req.q.as_deref().unwrap_or(""), req.system.as_deref())
        .await?;
    Ok(Json(json!({ "text": text })))
}

#[derive(Debug, Deserialize)]
pub struct AnswerStreamQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
}

/// GET /api/answer_stream — relay gateway tokens as SSE, in order, with an
/// explicit done/error terminator (never both, never neither).
pub async fn answer_stream(
    State(state): State<AppState>,
    Query(params): Query<AnswerStreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let query = params.q.as_deref().unwrap_or("").trim().to_string();
    if query.is_empty() {
        return Err(ApiError::Validation("q is required".into()));
    }
    let system = match params.system.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => crate::exam::prompts::answer_system_default().to_string(),
    };

    let mut upstream = state
        .gateway
        .complete_stream(
            &system,
            &query,
            CompletionOptions {
                temperature: 0.4,
                max_tokens: 512,
                structured_output: false,
            },
        )
        .await?;

    let stream = async_stream::stream! {
        while let Some(event) = upstream.next().await {
            match event {
                StreamEvent::Token(text) => {
                    yield Ok(Event::default().data(text));
                }
                StreamEvent::Done => {
                    yield Ok(Event::default().event("done").data("[DONE]"));
                    break;
                }
                StreamEvent::Error(message) => {
                    yield Ok(Event::default().event("error").data(message));
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
