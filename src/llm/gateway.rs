// src/llm/gateway.rs
// reqwest client for the OpenAI chat-completions API, speaking to either a
// managed (Azure) deployment or the direct endpoint. Streaming responses
// are parsed from SSE frames by hand; one token forwarded at a time.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, header};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CompletionApi, CompletionOptions, CompletionStream, StreamEvent};
use crate::config::AppConfig;
use crate::error::ApiError;

/// Which credential/endpoint pair the process is using. Fixed for the
/// process lifetime.
enum Endpoint {
    /// Azure OpenAI deployment: api-key header, deployment name as model id.
    Managed {
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
    /// Standard OpenAI: Bearer auth, configured model id.
    Direct { base_url: String, api_key: String },
}

pub struct OpenAiGateway {
    client: Client,
    /// reqwest's `timeout` is a whole-request deadline, which would cut a
    /// long token stream mid-flight. The streaming client bounds only the
    /// connection phase.
    stream_client: Client,
    endpoint: Endpoint,
    model_id: String,
}

impl OpenAiGateway {
    /// Select the provider once from configuration: a managed endpoint when
    /// an endpoint+key pair is present, otherwise the direct endpoint.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai_timeout))
            .build()?;
        let stream_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.openai_timeout))
            .build()?;

        let endpoint = match (&config.azure_endpoint, &config.azure_api_key) {
            (Some(azure_endpoint), Some(api_key)) => Endpoint::Managed {
                endpoint: azure_endpoint.trim_end_matches('/').to_string(),
                api_key: api_key.clone(),
                deployment: config
                    .azure_deployment
                    .clone()
                    .unwrap_or_else(|| config.model.clone()),
                api_version: config.azure_api_version.clone(),
            },
            _ => Endpoint::Direct {
                base_url: config.openai_base_url.trim_end_matches('/').to_string(),
                api_key: config.openai_api_key.clone().unwrap_or_default(),
            },
        };

        let model_id = match &endpoint {
            Endpoint::Managed { deployment, .. } => deployment.clone(),
            Endpoint::Direct { .. } => config.model.clone(),
        };

        Ok(Self {
            client,
            stream_client,
            endpoint,
            model_id,
        })
    }

    fn chat_request(&self, client: &Client, body: &Value) -> RequestBuilder {
        match &self.endpoint {
            Endpoint::Managed {
                endpoint,
                api_key,
                deployment,
                api_version,
            } => client
                .post(format!(
                    "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
                ))
                .header("api-key", api_key)
                .json(body),
            Endpoint::Direct { base_url, api_key } => client
                .post(format!("{base_url}/v1/chat/completions"))
                .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
                .json(body),
        }
    }

    fn request_body(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
        stream: bool,
    ) -> Value {
        let mut body = json!({
            "model": self.model_id,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });
        if options.structured_output {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if stream {
            body["stream"] = json!(true);
        }
        body
    }
}

#[async_trait]
impl CompletionApi for OpenAiGateway {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let body = self.request_body(system_prompt, user_prompt, &options, false);
        debug!(request_id = %request_id, model = %self.model_id, "completion request");

        let response = self
            .chat_request(&self.client, &body)
            .send()
            .await
            .map_err(|e| ApiError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Gateway(format!("{status}: {error_text}")));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Gateway(e.to_string()))?;

        let content = raw["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ApiError::Gateway("no content in completion response".into()))?
            .to_string();

        debug!(request_id = %request_id, chars = content.len(), "completion response");
        Ok(content)
    }

    async fn complete_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<CompletionStream, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let body = self.request_body(system_prompt, user_prompt, &options, true);
        debug!(request_id = %request_id, model = %self.model_id, "stream request");

        let response = self
            .chat_request(&self.stream_client, &body)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ApiError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Gateway(format!("{status}: {error_text}")));
        }

        let mut bytes_stream = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = String::new();
            'outer: loop {
                // Drain complete SSE events already buffered before reading more.
                while let Some(data) = drain_sse_data(&mut buffer) {
                    match event_from_data(&data) {
                        Some(StreamEvent::Done) => {
                            yield StreamEvent::Done;
                            break 'outer;
                        }
                        Some(StreamEvent::Error(msg)) => {
                            yield StreamEvent::Error(msg);
                            break 'outer;
                        }
                        Some(token) => yield token,
                        None => {}
                    }
                }

                match bytes_stream.next().await {
                    Some(Ok(bytes)) => append_chunk(&mut buffer, &bytes),
                    Some(Err(e)) => {
                        yield StreamEvent::Error(e.to_string());
                        break 'outer;
                    }
                    None => {
                        if !buffer.trim().is_empty() {
                            warn!(request_id = %request_id, "stream ended with unparsed data in buffer");
                        }
                        // Upstream closed without [DONE]; still terminate cleanly.
                        yield StreamEvent::Done;
                        break 'outer;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn append_chunk(buffer: &mut String, bytes: &Bytes) {
    buffer.push_str(&String::from_utf8_lossy(bytes));
}

/// Pop the data payload of the next complete SSE event (terminated by a
/// blank line, LF or CRLF) off the front of the buffer. Multi-line data
/// fields are joined with newlines per the SSE spec.
fn drain_sse_data(buffer: &mut String) -> Option<String> {
    let lf = buffer.find("\n\n");
    let crlf = buffer.find("\r\n\r\n");
    let (end, terminator_len) = match (lf, crlf) {
        (Some(lf), Some(crlf)) if crlf < lf => (crlf, 4),
        (Some(lf), _) => (lf, 2),
        (None, Some(crlf)) => (crlf, 4),
        (None, None) => return None,
    };
    let event_text = buffer[..end].to_string();
    buffer.drain(..end + terminator_len);

    let mut data_lines = Vec::new();
    for line in event_text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(data) = line.strip_prefix("data:") {
            data_lines.push(data.strip_prefix(' ').unwrap_or(data));
        }
        // "event:" lines are ignored; chat-completions signals via data.
    }

    if data_lines.is_empty() {
        // Comment-only frame (keep-alive); try the next one.
        return drain_sse_data(buffer);
    }
    Some(data_lines.join("\n"))
}

/// Map one SSE data payload to a stream event. Empty deltas yield None.
fn event_from_data(data: &str) -> Option<StreamEvent> {
    if data == "[DONE]" {
        return Some(StreamEvent::Done);
    }
    let json: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(_) => return None,
    };
    if let Some(error) = json.get("error") {
        let message = error["message"].as_str().unwrap_or("unknown error").to_string();
        return Some(StreamEvent::Error(message));
    }
    match json["choices"][0]["delta"]["content"].as_str() {
        Some(delta) if !delta.is_empty() => Some(StreamEvent::Token(delta.to_string())),
        _ => None,
    }
}
