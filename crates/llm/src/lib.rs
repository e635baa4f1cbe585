//! Clausewise LLM
//!
//! Streaming access to generative text models:
//! - `LlmProvider` trait yielding raw provider event streams
//! - Anthropic Claude implementation over the Messages SSE API
//! - Claude API stream adapter (SSE decoding + normalization to canonical events)
//! - HTTP client factory

pub mod anthropic;
pub mod http_client;
pub mod provider;
pub mod streaming_adapters;
pub mod types;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use http_client::build_http_client;
pub use provider::{LlmProvider, ProviderEvent, ProviderEventStream};
pub use types::*;

// Re-export streaming adapters
pub use streaming_adapters::{ClaudeApiAdapter, ClaudeApiEvent};
