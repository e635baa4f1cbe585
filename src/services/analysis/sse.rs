//! SSE Encoder
//!
//! Serializes canonical events into the client wire format:
//! `data: {"type": ..., "content": ...}\n\n`.

use async_trait::async_trait;
use bytes::Bytes;
use clausewise_core::streaming::{EventPayload, StreamEvent};
use clausewise_core::CoreResult;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;

use super::orchestrator::EventSink;

/// One client-facing frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub content: String,
}

impl WireFrame {
    fn new(frame_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            frame_type: frame_type.into(),
            content: content.into(),
        }
    }

    /// Decode one `data: ...` frame. Returns `None` for anything else.
    pub fn parse(frame: &str) -> Option<Self> {
        let payload = frame.trim().strip_prefix("data:")?.trim_start();
        serde_json::from_str(payload).ok()
    }
}

/// Round to milliseconds for display.
fn round_secs(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Map a canonical event to its wire frame.
pub fn to_wire(event: &StreamEvent) -> WireFrame {
    match &event.payload {
        EventPayload::Phase { phase } => WireFrame::new("phase", phase.as_str()),
        EventPayload::BlockStart { block_type } => {
            WireFrame::new(format!("{}_start", block_type), "")
        }
        EventPayload::BlockDone { block_type } => WireFrame::new(format!("{}_done", block_type), ""),
        EventPayload::ReasoningDelta { content } => WireFrame::new("thinking", content.as_str()),
        EventPayload::TextDelta { content } => WireFrame::new("text", content.as_str()),
        EventPayload::WorkerDone {
            elapsed_secs,
            model,
        } => WireFrame::new(
            format!("{}_done", event.source),
            json!({ "elapsed": round_secs(*elapsed_secs), "model": model }).to_string(),
        ),
        EventPayload::Error { message } => WireFrame::new("error", message.as_str()),
        EventPayload::SessionDone {
            fast_elapsed_secs,
            slow_elapsed_secs,
            model,
        } => WireFrame::new(
            "done",
            json!({
                "fast_elapsed": fast_elapsed_secs.map(round_secs),
                "slow_elapsed": round_secs(*slow_elapsed_secs),
                "model": model,
            })
            .to_string(),
        ),
    }
}

/// Encode a canonical event as one SSE frame.
pub fn encode(event: &StreamEvent) -> CoreResult<Bytes> {
    encode_frame(&to_wire(event))
}

/// Encode an already-built wire frame.
pub fn encode_frame(frame: &WireFrame) -> CoreResult<Bytes> {
    let body = serde_json::to_string(frame)?;
    Ok(Bytes::from(format!("data: {}\n\n", body)))
}

/// Event sink that encodes every event and forwards the bytes unchanged.
#[derive(Debug, Clone)]
pub struct SseSink {
    tx: mpsc::Sender<Bytes>,
}

impl SseSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for SseSink {
    async fn deliver(&mut self, event: StreamEvent) -> bool {
        match encode(&event) {
            Ok(frame) => self.tx.send(frame).await.is_ok(),
            Err(e) => {
                tracing::error!("Dropping unencodable {} event: {}", event.payload.kind(), e);
                true
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
