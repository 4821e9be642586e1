// src/llm/mod.rs
// Completion gateway seam: trait + option/event types shared by the
// orchestrator and the streaming relay.

pub mod gateway;

pub use gateway::OpenAiGateway;

use crate::error::ApiError;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Per-call knobs for a completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider to constrain output to a JSON object. The gateway
    /// never validates the shape; that is the parser's job.
    pub structured_output: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 512,
            structured_output: false,
        }
    }
}

/// One event on a token stream. Terminal after Done or Error.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Token(String),
    Done,
    Error(String),
}

/// Finite, single-pass token stream from the provider.
pub type CompletionStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Uniform interface to the chat-completion capability. Provider selection
/// (managed vs direct endpoint) happens once at construction, never per call.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Model identifier reported back to callers and persisted with log rows.
    fn model_id(&self) -> &str;

    /// Non-streaming completion. Any upstream failure surfaces as a single
    /// `ApiError::Gateway` carrying the provider's message; no retry.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, ApiError>;

    /// Streaming completion. Yields tokens in arrival order and exactly one
    /// terminal event. Dropping the stream releases the connection.
    async fn complete_stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<CompletionStream, ApiError>;
}
