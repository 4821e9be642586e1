// src/web/mod.rs
// HTTP surface for the oral-exam backend.

pub mod exam;
pub mod logs;
pub mod speech;
pub mod state;
pub mod stream;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::web::state::AppState;

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        // Exam turn orchestration
        .route("/start_exam", post(exam::start_exam))
        .route("/exam_turn", post(exam::exam_turn))
        .route("/feedback", post(exam::feedback))
        .route("/dictionary_ai", post(exam::dictionary_ai))
        // Free-form answers (plain + SSE relay)
        .route("/answer", post(stream::answer_plain))
        .route("/answer_stream", get(stream::answer_stream))
        // Speech transcoding
        .route("/stt", post(speech::stt))
        .route("/tts", post(speech::tts))
        // Analysis log CRUD
        .route("/logs", get(logs::list_logs).post(logs::create_log))
        .route(
            "/logs/{id}",
            get(logs::get_log).put(logs::update_log).delete(logs::delete_log),
        );

    Router::new()
        .route("/health", get(logs::health))
        .route("/db-check", get(logs::db_check))
        .route("/audit", get(logs::audit_view))
        .route("/audit/clear", post(logs::audit_clear))
        .nest("/api", api_router)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
