//! Scripted provider shared by the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clausewise::services::analysis::{AnalysisOutcome, Orchestrator, OrchestratorConfig, WorkerPlan};
use clausewise_core::streaming::{EventPayload, StreamEvent, WorkerLabel};
use clausewise_llm::{
    ClaudeApiEvent, LlmError, LlmProvider, LlmResult, ModelRequest, ProviderEventStream,
};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub const FAST_MODEL: &str = "fast-test-model";
pub const SLOW_MODEL: &str = "slow-test-model";

/// One step of a scripted model stream
#[derive(Debug, Clone)]
pub enum Step {
    Emit(ClaudeApiEvent),
    Wait(Duration),
    Fail(LlmError),
    /// Stop producing output but keep the stream open until it is dropped
    Stall,
}

pub fn text_block(text: &str) -> Vec<Step> {
    vec![
        Step::Emit(ClaudeApiEvent::block_start("text")),
        Step::Emit(ClaudeApiEvent::text(text)),
        Step::Emit(ClaudeApiEvent::block_stop()),
    ]
}

pub fn wait_ms(ms: u64) -> Step {
    Step::Wait(Duration::from_millis(ms))
}

/// Provider replaying one script per model id
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, Vec<Step>>,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, model: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(model.to_string(), steps);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Stalled streams whose consumer has gone away
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub async fn wait_released(&self, expected: usize) -> bool {
        for _ in 0..100 {
            if self.released() >= expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn supports_thinking(&self, _model: &str) -> bool {
        true
    }

    async fn open_stream(&self, request: &ModelRequest) -> LlmResult<ProviderEventStream> {
        let steps = self
            .scripts
            .get(&request.model)
            .cloned()
            .ok_or_else(|| LlmError::ModelNotFound {
                model: request.model.clone(),
            })?;
        self.opened.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(16);
        let released = Arc::clone(&self.released);
        tokio::spawn(async move {
            for step in steps {
                match step {
                    Step::Emit(event) => {
                        if tx.send(Ok(event)).await.is_err() {
                            return;
                        }
                    }
                    Step::Wait(duration) => tokio::time::sleep(duration).await,
                    Step::Fail(err) => {
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                    Step::Stall => {
                        tx.closed().await;
                        released.fetch_add(1, Ordering::SeqCst);
                        return;
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

pub fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        poll_interval: Duration::from_millis(20),
        ..Default::default()
    }
}

pub fn orchestrator(provider: Arc<ScriptedProvider>, config: OrchestratorConfig) -> Orchestrator {
    Orchestrator::new(provider, config)
}

pub fn request(model: &str) -> ModelRequest {
    ModelRequest::new(model, "system", "document", 1024)
}

/// Run a plan to completion, collecting every delivered event
pub async fn run_collect(
    orchestrator: Orchestrator,
    plan: WorkerPlan,
) -> (AnalysisOutcome, Vec<StreamEvent>) {
    let (tx, rx) = mpsc::channel(64);
    let handle = tokio::spawn(async move {
        let mut sink = tx;
        orchestrator.run(plan, &mut sink).await
    });
    let events = drain(rx).await;
    let outcome = handle.await.expect("orchestrator task panicked");
    (outcome, events)
}

/// Drain everything delivered to a channel sink
pub async fn drain(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

pub fn is_worker_done(event: &StreamEvent) -> bool {
    matches!(event.payload, EventPayload::WorkerDone { .. })
}

pub fn errors(events: &[StreamEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::Error { message } => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

pub fn labels(events: &[StreamEvent]) -> Vec<WorkerLabel> {
    events.iter().map(|e| e.source).collect()
}
