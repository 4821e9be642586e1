// src/web/speech.rs
// STT (multipart upload) and TTS handlers.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::speech::{MIN_AUDIO_BYTES, SpeechClient};
use crate::web::state::AppState;

fn speech_client(state: &AppState) -> Result<&SpeechClient, ApiError> {
    state
        .speech
        .as_deref()
        .ok_or_else(|| ApiError::Gateway("speech service not configured".into()))
}

/// POST /api/stt — multipart form with `file` (audio) and optional `lang`
/// (BCP-47, mapped to its primary subtag for Whisper).
pub async fn stt(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut audio: Option<(Bytes, String)> = None;
    let mut lang_in = "en-GB".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "audio.webm".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read upload: {e}")))?;
                audio = Some((data, filename));
            }
            Some("lang") => {
                if let Ok(value) = field.text().await {
                    let value = value.trim().to_string();
                    if !value.is_empty() {
                        lang_in = value;
                    }
                }
            }
            _ => {}
        }
    }

    let Some((data, filename)) = audio else {
        return Err(ApiError::Validation(
            "audio file is required (form field 'file')".into(),
        ));
    };
    if data.len() < MIN_AUDIO_BYTES {
        return Err(ApiError::Validation(format!(
            "empty or too-small audio upload ({} bytes)",
            data.len()
        )));
    }

    let lang = SpeechClient::whisper_lang(&lang_in);
    let client = speech_client(&state)?;
    let transcript = client.transcribe(data, &filename, &lang).await?;

    Ok(Json(json!({
        "transcript": transcript,
        "lang_used": lang,
    })))
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
}

/// POST /api/tts — returns audio/mpeg bytes.
pub async fn tts(
    State(state): State<AppState>,
    Json(req): Json<TtsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.text.as_deref().unwrap_or("").trim().to_string();
    if text.is_empty() {
        return Err(ApiError::Validation("text is required".into()));
    }

    let client = speech_client(&state)?;
    let audio = client.synthesize(&text, req.voice.as_deref()).await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}
