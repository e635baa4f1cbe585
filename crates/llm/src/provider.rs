//! LLM Provider Trait
//!
//! Defines the common interface for streaming providers.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::streaming_adapters::ClaudeApiEvent;
use super::types::{LlmError, LlmResult, ModelRequest};

/// Raw provider event delivered to workers.
pub type ProviderEvent = ClaudeApiEvent;

/// Stream of raw provider events for one invocation.
///
/// Dropping the stream releases the underlying connection. An `Err` item
/// is always the last item of the stream.
pub type ProviderEventStream = BoxStream<'static, LlmResult<ProviderEvent>>;

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns whether the given model supports extended reasoning.
    fn supports_thinking(&self, model: &str) -> bool;

    /// Open one streaming invocation.
    ///
    /// Fails before any event is produced if the request is rejected
    /// (missing key, HTTP error status, connection failure).
    async fn open_stream(&self, request: &ModelRequest) -> LlmResult<ProviderEventStream>;
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Pull `error.message` out of a JSON error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    let message = error_message(body);
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound { model: message },
        429 => LlmError::RateLimited {
            message,
            retry_after: None,
        },
        400 => LlmError::InvalidRequest { message },
        500..=599 => LlmError::ServerError {
            message,
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, message),
        },
    }
}
