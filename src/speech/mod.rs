// src/speech/mod.rs
// Speech-to-text (Whisper) and text-to-speech proxies. These always use the
// direct OpenAI endpoint, independent of the chat gateway's provider
// selection.

use anyhow::Result;
use bytes::Bytes;
use reqwest::{Client, header, multipart};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::ApiError;

/// Uploads smaller than this are rejected as empty/truncated recordings.
pub const MIN_AUDIO_BYTES: usize = 2000;

pub struct SpeechClient {
    client: Client,
    api_key: String,
    base_url: String,
    stt_model: String,
    tts_model: String,
    default_voice: String,
}

impl SpeechClient {
    /// None when no direct API key is configured; the speech endpoints then
    /// report an unconfigured-service error instead of failing at startup.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.openai_api_key.clone() else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai_timeout))
            .build()?;
        Ok(Some(Self {
            client,
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            stt_model: config.stt_model.clone(),
            tts_model: config.tts_model.clone(),
            default_voice: config.tts_default_voice.clone(),
        }))
    }

    /// Map a BCP-47 tag to Whisper's primary-subtag form: 'en-GB' -> 'en'.
    pub fn whisper_lang(tag: &str) -> String {
        let primary = tag.trim().split('-').next().unwrap_or("");
        if primary.is_empty() {
            "en".to_string()
        } else {
            primary.to_lowercase()
        }
    }

    /// Transcribe an audio upload. Callers enforce the minimum byte size.
    pub async fn transcribe(
        &self,
        audio: Bytes,
        filename: &str,
        lang: &str,
    ) -> Result<String, ApiError> {
        debug!(bytes = audio.len(), lang, "stt request");

        let part = multipart::Part::bytes(audio.to_vec()).file_name(filename.to_string());
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.stt_model.clone())
            .text("response_format", "text")
            .text("language", lang.to_string())
            .text("temperature", "0");

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Gateway(format!("STT failed {status}: {error_text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Gateway(e.to_string()))?;
        Ok(text.trim().to_string())
    }

    /// Synthesize speech, returning the full audio body (mp3).
    pub async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Bytes, ApiError> {
        let voice = match voice.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => &self.default_voice,
        };
        debug!(chars = text.len(), voice, "tts request");

        let body: Value = json!({
            "model": self.tts_model,
            "voice": voice,
            "input": text,
        });

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Gateway(format!("TTS failed {status}: {error_text}")));
        }

        response
            .bytes()
            .await
            .map_err(|e| ApiError::Gateway(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcp47_maps_to_primary_subtag() {
        assert_eq!(SpeechClient::whisper_lang("en-GB"), "en");
        assert_eq!(SpeechClient::whisper_lang("DE-at"), "de");
        assert_eq!(SpeechClient::whisper_lang("fr"), "fr");
        assert_eq!(SpeechClient::whisper_lang(""), "en");
        assert_eq!(SpeechClient::whisper_lang("-GB"), "en");
    }
}
