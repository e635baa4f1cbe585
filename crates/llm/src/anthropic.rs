//! Anthropic Claude Provider
//!
//! Implementation of the LlmProvider trait for Anthropic's Messages API.
//! Responses are consumed as SSE and decoded line by line into raw
//! `ClaudeApiEvent`s; normalization is left to the consumer.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

use crate::http_client::build_http_client;
use crate::provider::{
    missing_api_key_error, parse_http_error, LlmProvider, ProviderEvent, ProviderEventStream,
};
use crate::streaming_adapters::claude_api::{parse_sse_line, ApiError, ClaudeApiEvent};
use crate::types::{LlmError, LlmResult, ModelRequest, ProviderConfig};

/// Default Anthropic API base URL
const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";

/// Current API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    /// Full messages API URL, computed once at construction.
    messages_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(&config)?;
        let messages_url =
            Self::messages_url(config.base_url.as_deref().unwrap_or(ANTHROPIC_API_BASE))?;

        tracing::info!("Anthropic provider initialized: url={}", messages_url);

        Ok(Self {
            config,
            client,
            messages_url,
        })
    }

    /// Normalize a configured base URL to the messages endpoint.
    ///
    /// Accepts a bare host, a `/v1` base or the full `/v1/messages` URL.
    fn messages_url(raw: &str) -> LlmResult<String> {
        let base = raw
            .trim_end_matches('/')
            .trim_end_matches("/messages")
            .trim_end_matches("/v1")
            .trim_end_matches('/');
        let url = url::Url::parse(&format!("{}/v1/messages", base)).map_err(|e| {
            LlmError::InvalidRequest {
                message: format!("invalid base URL '{}': {}", raw, e),
            }
        })?;
        Ok(url.to_string())
    }

    /// Build the JSON request body for one streaming invocation.
    fn build_request_body(&self, request: &ModelRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "stream": true,
            "system": request.system,
            "messages": [{
                "role": "user",
                "content": request.user_message,
            }],
        });

        if self.supports_thinking(&request.model) {
            if let Some(budget) = request.thinking_budget() {
                body["thinking"] = serde_json::json!({
                    "type": "enabled",
                    "budget_tokens": budget
                });
            }
        }

        body
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn supports_thinking(&self, model: &str) -> bool {
        let model = model.to_lowercase();
        model.contains("claude-3-7")
            || model.contains("sonnet-4")
            || model.contains("opus-4")
            || model.contains("haiku-4")
    }

    async fn open_stream(&self, request: &ModelRequest) -> LlmResult<ProviderEventStream> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("anthropic"))?;

        let body = self.build_request_body(request);
        tracing::debug!(
            "Anthropic stream POST {} model={} max_tokens={}",
            self.messages_url,
            request.model,
            request.max_tokens
        );

        let response = self
            .client
            .post(self.messages_url.as_str())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;
            tracing::warn!(
                "Anthropic API error: HTTP {} from {}: {}",
                status,
                self.messages_url,
                body_text
            );
            return Err(parse_http_error(status, &body_text, "anthropic"));
        }

        Ok(decode_event_stream(Box::pin(response.bytes_stream())))
    }
}

/// Map an in-band `error` SSE event to a provider error.
fn stream_error(error: ApiError) -> LlmError {
    match error.error_type.as_deref() {
        Some("authentication_error") | Some("permission_error") => {
            LlmError::AuthenticationFailed {
                message: error.message,
            }
        }
        Some("rate_limit_error") => LlmError::RateLimited {
            message: error.message,
            retry_after: None,
        },
        Some("invalid_request_error") => LlmError::InvalidRequest {
            message: error.message,
        },
        _ => LlmError::ServerError {
            message: error.message,
            status: None,
        },
    }
}

/// Line-buffering SSE decoder state.
struct SseDecoder<S> {
    inner: S,
    /// Bytes of the current incomplete line
    buffer: Vec<u8>,
    pending: VecDeque<LlmResult<ProviderEvent>>,
    finished: bool,
}

impl<S> SseDecoder<S> {
    fn push_chunk(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        while !self.finished {
            let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.push_line(&String::from_utf8_lossy(&line));
        }
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.push_line(&String::from_utf8_lossy(&line));
        }
        self.finished = true;
    }

    fn push_line(&mut self, line: &str) {
        match parse_sse_line(line) {
            Ok(Some(ClaudeApiEvent::Error { error })) => {
                self.pending.push_back(Err(stream_error(error)));
                self.finished = true;
            }
            Ok(Some(event)) => self.pending.push_back(Ok(event)),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping malformed stream line: {}", e),
        }
    }
}

/// Decode a byte stream of SSE frames into raw provider events.
///
/// Lines are split on raw bytes before UTF-8 decoding, so multi-byte
/// characters split across chunks survive intact. Decoding stops after the
/// first error item.
pub fn decode_event_stream<S, E>(inner: S) -> ProviderEventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let decoder = SseDecoder {
        inner,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(decoder, |mut dec| async move {
        loop {
            if let Some(item) = dec.pending.pop_front() {
                return Some((item, dec));
            }
            if dec.finished {
                return None;
            }
            match dec.inner.next().await {
                Some(Ok(chunk)) => dec.push_chunk(&chunk),
                Some(Err(e)) => {
                    dec.pending.push_back(Err(LlmError::NetworkError {
                        message: e.to_string(),
                    }));
                    dec.finished = true;
                }
                None => dec.flush(),
            }
        }
    })
    .boxed()
}
