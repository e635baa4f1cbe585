//! Claude API Adapter
//!
//! Decodes the Messages API SSE format and normalizes its block-start /
//! delta / block-stop events into canonical payloads.

use clausewise_core::streaming::{AdapterError, EventPayload, StreamAdapter};
use serde::Deserialize;

/// Raw event from the Claude API SSE stream
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeApiEvent {
    MessageStart {
        message: MessageInfo,
    },
    ContentBlockStart {
        #[serde(default)]
        index: usize,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        #[serde(default)]
        index: usize,
        delta: Delta,
    },
    ContentBlockStop {
        #[serde(default)]
        index: usize,
    },
    MessageDelta {
        #[serde(default)]
        delta: MessageDelta,
        #[serde(default)]
        usage: Option<DeltaUsage>,
    },
    MessageStop,
    Ping,
    Error {
        error: ApiError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageInfo {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Declared content block; only the type matters for normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta {
        text: String,
    },
    ThinkingDelta {
        thinking: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageDelta {
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeltaUsage {
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

impl ClaudeApiEvent {
    /// Shorthand for a block-start event.
    pub fn block_start(block_type: impl Into<String>) -> Self {
        ClaudeApiEvent::ContentBlockStart {
            index: 0,
            content_block: ContentBlock {
                block_type: block_type.into(),
            },
        }
    }

    /// Shorthand for an output-text delta.
    pub fn text(text: impl Into<String>) -> Self {
        ClaudeApiEvent::ContentBlockDelta {
            index: 0,
            delta: Delta::TextDelta { text: text.into() },
        }
    }

    /// Shorthand for a reasoning delta.
    pub fn thinking(thinking: impl Into<String>) -> Self {
        ClaudeApiEvent::ContentBlockDelta {
            index: 0,
            delta: Delta::ThinkingDelta {
                thinking: thinking.into(),
            },
        }
    }

    /// Shorthand for a block-stop event.
    pub fn block_stop() -> Self {
        ClaudeApiEvent::ContentBlockStop { index: 0 }
    }
}

/// Parse one SSE line into a raw event.
///
/// SSE streams may include `event:`, `id:`, `retry:`, comment and empty
/// lines; those yield `Ok(None)`, as does the `[DONE]` terminator.
pub fn parse_sse_line(input: &str) -> Result<Option<ClaudeApiEvent>, AdapterError> {
    let trimmed = input.trim();

    let json_str = if let Some(rest) = trimmed.strip_prefix("data:") {
        rest.trim_start()
    } else if trimmed.starts_with('{') {
        // Raw JSON without SSE prefix
        trimmed
    } else {
        return Ok(None);
    };

    if json_str.is_empty() || json_str == "[DONE]" {
        return Ok(None);
    }

    serde_json::from_str(json_str)
        .map(Some)
        .map_err(|e| AdapterError::ParseError(e.to_string()))
}

/// Normalizer for Claude API raw events
#[derive(Debug)]
pub struct ClaudeApiAdapter {
    /// Type of the content block opened by the last block-start
    open_block: Option<String>,
}

impl ClaudeApiAdapter {
    pub fn new() -> Self {
        Self { open_block: None }
    }

    /// Type of the currently open content block, if any.
    pub fn open_block(&self) -> Option<&str> {
        self.open_block.as_deref()
    }
}

impl Default for ClaudeApiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAdapter for ClaudeApiAdapter {
    type Raw = ClaudeApiEvent;

    fn adapt(&mut self, raw: ClaudeApiEvent) -> Vec<EventPayload> {
        match raw {
            ClaudeApiEvent::ContentBlockStart { content_block, .. } => {
                self.open_block = Some(content_block.block_type.clone());
                vec![EventPayload::BlockStart {
                    block_type: content_block.block_type,
                }]
            }
            ClaudeApiEvent::ContentBlockDelta { delta, .. } => match delta {
                Delta::TextDelta { text } => vec![EventPayload::TextDelta { content: text }],
                Delta::ThinkingDelta { thinking } => {
                    vec![EventPayload::ReasoningDelta { content: thinking }]
                }
                Delta::Other => vec![],
            },
            ClaudeApiEvent::ContentBlockStop { .. } => match self.open_block.take() {
                Some(block_type) => vec![EventPayload::BlockDone { block_type }],
                None => vec![],
            },
            ClaudeApiEvent::Error { error } => vec![EventPayload::Error {
                message: error.message,
            }],
            ClaudeApiEvent::MessageStart { .. }
            | ClaudeApiEvent::MessageDelta { .. }
            | ClaudeApiEvent::MessageStop
            | ClaudeApiEvent::Ping
            | ClaudeApiEvent::Unknown => vec![],
        }
    }
}
