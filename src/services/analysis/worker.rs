//! Model Stream Worker
//!
//! Drives one streaming model invocation end-to-end and forwards its raw
//! events, tagged with the worker label, onto the session's shared channel.

use std::sync::Arc;
use std::time::Instant;

use clausewise_core::streaming::WorkerLabel;
use clausewise_llm::{ClaudeApiEvent, LlmProvider, ModelRequest, ProviderEvent, UsageStats};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What a worker reports
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessageKind {
    /// One raw provider event, in stream order
    Event(ProviderEvent),
    /// The invocation finished normally
    Done { elapsed_secs: f64, model: String },
    /// The invocation failed; no further messages follow from this worker
    Error { message: String },
}

/// Message on the shared worker channel
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerMessage {
    pub label: WorkerLabel,
    pub kind: WorkerMessageKind,
}

impl WorkerMessage {
    pub fn event(label: WorkerLabel, event: ProviderEvent) -> Self {
        Self {
            label,
            kind: WorkerMessageKind::Event(event),
        }
    }

    pub fn done(label: WorkerLabel, elapsed_secs: f64, model: impl Into<String>) -> Self {
        Self {
            label,
            kind: WorkerMessageKind::Done {
                elapsed_secs,
                model: model.into(),
            },
        }
    }

    pub fn error(label: WorkerLabel, message: impl Into<String>) -> Self {
        Self {
            label,
            kind: WorkerMessageKind::Error {
                message: message.into(),
            },
        }
    }
}

/// A worker to start: its label and the request it runs
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub label: WorkerLabel,
    pub request: ModelRequest,
}

impl WorkerSpec {
    pub fn new(label: WorkerLabel, request: ModelRequest) -> Self {
        Self { label, request }
    }
}

/// Run one worker to completion.
///
/// Sends every provider event, then exactly one `Done` or `Error`. Returns
/// early without a sentinel when cancelled or when the channel is closed.
/// The provider stream is dropped on every exit path.
pub async fn run_worker(
    provider: Arc<dyn LlmProvider>,
    spec: WorkerSpec,
    tx: mpsc::Sender<WorkerMessage>,
    cancel: CancellationToken,
) {
    let WorkerSpec { label, request } = spec;
    let start_time = Instant::now();
    tracing::info!(
        "{} worker starting: model={} max_tokens={} thinking={}",
        label,
        request.model,
        request.max_tokens,
        request.enable_thinking
    );

    let opened = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!("{} worker cancelled before stream opened", label);
            return;
        }
        result = provider.open_stream(&request) => result,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("{} worker failed to open stream: {}", label, e);
            let _ = tx.send(WorkerMessage::error(label, e.to_string())).await;
            return;
        }
    };

    let mut usage = UsageStats::default();
    let mut first_token_logged = false;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("{} worker cancelled", label);
                return;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                match &event {
                    ClaudeApiEvent::MessageStart { message } => {
                        if let Some(start_usage) = &message.usage {
                            usage.input_tokens = start_usage.input_tokens;
                        }
                    }
                    ClaudeApiEvent::ContentBlockDelta { .. } if !first_token_logged => {
                        first_token_logged = true;
                        tracing::info!(
                            "{} worker first token after {:.2}s",
                            label,
                            start_time.elapsed().as_secs_f64()
                        );
                    }
                    ClaudeApiEvent::MessageDelta {
                        usage: Some(delta_usage),
                        ..
                    } => {
                        usage.output_tokens = delta_usage.output_tokens;
                    }
                    _ => {}
                }

                if tx.send(WorkerMessage::event(label, event)).await.is_err() {
                    tracing::debug!("{} worker channel closed; stopping", label);
                    return;
                }
            }
            Some(Err(e)) => {
                tracing::warn!("{} worker stream error: {}", label, e);
                let _ = tx.send(WorkerMessage::error(label, e.to_string())).await;
                return;
            }
            None => break,
        }
    }

    let elapsed_secs = start_time.elapsed().as_secs_f64();
    tracing::info!(
        "{} worker finished in {:.2}s (input_tokens={}, output_tokens={})",
        label,
        elapsed_secs,
        usage.input_tokens,
        usage.output_tokens
    );
    let _ = tx
        .send(WorkerMessage::done(label, elapsed_secs, request.model))
        .await;
}
