//! Provider-Specific Stream Adapters
//!
//! Each adapter decodes the streaming format of its provider and normalizes it
//! into canonical payloads.

pub mod claude_api;

pub use claude_api::{parse_sse_line, ClaudeApiAdapter, ClaudeApiEvent};
