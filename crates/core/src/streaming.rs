//! Canonical Stream Event Types
//!
//! Provider-agnostic event vocabulary exchanged between the stream adapters
//! (LLM crate), the analysis orchestrator and the SSE encoder (main crate).
//! Every event carries the label of the worker that produced it.

use serde::{Deserialize, Serialize};

/// Identifies which model worker produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerLabel {
    /// Small-budget worker whose output is shown first
    Fast,
    /// Large-budget worker whose output is held until the fast worker finishes
    Slow,
}

impl WorkerLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerLabel::Fast => "fast",
            WorkerLabel::Slow => "slow",
        }
    }
}

impl std::fmt::Display for WorkerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a canonical stream event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A section boundary marker was recognized in the output text
    Phase { phase: String },

    /// A content block opened; `block_type` is the provider's declared type
    /// (e.g. "thinking" or "text")
    BlockStart { block_type: String },

    /// The currently open content block closed
    BlockDone { block_type: String },

    /// Incremental reasoning text
    ReasoningDelta { content: String },

    /// Incremental output text
    TextDelta { content: String },

    /// A worker finished its invocation
    WorkerDone { elapsed_secs: f64, model: String },

    /// Provider or transport failure; terminates the session
    Error { message: String },

    /// Every worker of the session finished
    SessionDone {
        #[serde(skip_serializing_if = "Option::is_none")]
        fast_elapsed_secs: Option<f64>,
        slow_elapsed_secs: f64,
        model: String,
    },
}

impl EventPayload {
    /// Short name of the payload variant, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Phase { .. } => "phase",
            EventPayload::BlockStart { .. } => "block_start",
            EventPayload::BlockDone { .. } => "block_done",
            EventPayload::ReasoningDelta { .. } => "reasoning_delta",
            EventPayload::TextDelta { .. } => "text_delta",
            EventPayload::WorkerDone { .. } => "worker_done",
            EventPayload::Error { .. } => "error",
            EventPayload::SessionDone { .. } => "session_done",
        }
    }
}

/// A canonical event tagged with its source worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamEvent {
    pub source: WorkerLabel,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl StreamEvent {
    pub fn new(source: WorkerLabel, payload: EventPayload) -> Self {
        Self { source, payload }
    }
}

/// Errors that can occur while decoding raw provider stream input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AdapterError {
    /// JSON/data parsing error
    ParseError(String),
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Trait for normalizing provider-specific raw events into canonical payloads.
///
/// Adapters hold only per-stream tracking state (such as the currently open
/// content block), so one instance must be used per stream.
pub trait StreamAdapter: Send {
    /// Raw event type produced by the provider.
    type Raw;

    /// Map one raw event to zero or more canonical payloads, preserving order.
    fn adapt(&mut self, raw: Self::Raw) -> Vec<EventPayload>;
}
