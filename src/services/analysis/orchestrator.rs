//! Dual-Stream Orchestrator
//!
//! Runs the session's workers concurrently and merges their events into one
//! client-facing sequence. In dual mode every fast event reaches the client
//! first, then `fast_done`, then the slow worker's events in arrival order,
//! then `session_done`. Any worker error ends the session with exactly one
//! `error` event.
//!
//! The ordering rules live in [`SessionMachine`], which is synchronous; the
//! [`Orchestrator`] owns the tasks, the shared channel and the polling loop.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use clausewise_core::streaming::{EventPayload, StreamAdapter, StreamEvent, WorkerLabel};
use clausewise_llm::{ClaudeApiAdapter, LlmProvider, ModelRequest};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::phase::{PhaseDetector, DEFAULT_MARKERS};
use super::worker::{run_worker, WorkerMessage, WorkerMessageKind, WorkerSpec};
use crate::models::settings::AnalysisSettings;

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    BothRunning,
    FastDoneBufferingSlow,
    FlushingSlowBuffer,
    SlowLiveOnly,
    SessionDone,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::SessionDone | SessionState::Aborted)
    }
}

/// Which workers a session runs
#[derive(Debug, Clone)]
pub enum WorkerPlan {
    /// Fast identification worker plus slow card worker
    Dual {
        fast: ModelRequest,
        slow: ModelRequest,
    },
    /// One worker, labeled `fast`, forwarded live (comparison mode)
    Single(ModelRequest),
}

impl WorkerPlan {
    pub fn is_dual(&self) -> bool {
        matches!(self, WorkerPlan::Dual { .. })
    }

    pub fn into_specs(self) -> Vec<WorkerSpec> {
        match self {
            WorkerPlan::Dual { fast, slow } => vec![
                WorkerSpec::new(WorkerLabel::Fast, fast),
                WorkerSpec::new(WorkerLabel::Slow, slow),
            ],
            WorkerPlan::Single(request) => vec![WorkerSpec::new(WorkerLabel::Fast, request)],
        }
    }
}

/// Destination of merged events
#[async_trait]
pub trait EventSink: Send {
    /// Deliver one event. Returns `false` once the client is gone.
    async fn deliver(&mut self, event: StreamEvent) -> bool;

    /// Whether the client is known to be gone.
    fn is_closed(&self) -> bool;
}

#[async_trait]
impl EventSink for mpsc::Sender<StreamEvent> {
    async fn deliver(&mut self, event: StreamEvent) -> bool {
        self.send(event).await.is_ok()
    }

    fn is_closed(&self) -> bool {
        mpsc::Sender::is_closed(self)
    }
}

/// Loop tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub channel_capacity: usize,
    pub poll_interval: Duration,
    pub idle_timeout: Duration,
    pub phase_window_capacity: usize,
    pub phase_window_tail: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&AnalysisSettings::default())
    }
}

impl From<&AnalysisSettings> for OrchestratorConfig {
    fn from(settings: &AnalysisSettings) -> Self {
        Self {
            channel_capacity: settings.channel_capacity,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            idle_timeout: Duration::from_secs(settings.idle_timeout_secs),
            phase_window_capacity: settings.phase_window_capacity,
            phase_window_tail: settings.phase_window_tail,
        }
    }
}

/// Result of one orchestrated session
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub state: SessionState,
    /// Every state entered, in order, starting with the initial state
    pub transitions: Vec<SessionState>,
    /// Accumulated output text of the fast worker
    pub fast_text: String,
    /// Accumulated output text of the slow worker
    pub slow_text: String,
    pub fast_elapsed_secs: Option<f64>,
    pub slow_elapsed_secs: Option<f64>,
    /// Message of the `error` event, when the session aborted on an error
    pub error: Option<String>,
    /// Whether the session ended because the client went away
    pub disconnected: bool,
    /// Phase ids in emission order
    pub phases: Vec<String>,
    /// Number of events delivered to the client
    pub events_delivered: usize,
}

impl AnalysisOutcome {
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::SessionDone
    }
}

/// Ordering state machine for one session.
///
/// Owns the hold buffer, per-stream adapters, the phase detector and the
/// accumulated texts. Feed it worker messages; it returns the events to
/// deliver, in order.
#[derive(Debug)]
pub struct SessionMachine {
    dual: bool,
    state: SessionState,
    transitions: Vec<SessionState>,
    held: VecDeque<WorkerMessage>,
    adapters: HashMap<WorkerLabel, ClaudeApiAdapter>,
    detector: PhaseDetector,
    texts: HashMap<WorkerLabel, String>,
    elapsed: HashMap<WorkerLabel, f64>,
    phases: Vec<String>,
    error: Option<String>,
    disconnected: bool,
}

impl SessionMachine {
    pub fn new(dual: bool, detector: PhaseDetector) -> Self {
        Self {
            dual,
            state: SessionState::BothRunning,
            transitions: vec![SessionState::BothRunning],
            held: VecDeque::new(),
            adapters: HashMap::new(),
            detector,
            texts: HashMap::new(),
            elapsed: HashMap::new(),
            phases: Vec::new(),
            error: None,
            disconnected: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Number of slow messages waiting for the fast worker to finish.
    pub fn held_len(&self) -> usize {
        self.held.len()
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.transitions.push(next);
    }

    /// Process one worker message.
    pub fn handle(&mut self, message: WorkerMessage) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        if self.is_terminal() {
            return out;
        }

        if let WorkerMessageKind::Error { message: text } = &message.kind {
            self.abort_with(message.label, text.clone(), &mut out);
            return out;
        }

        if self.dual
            && message.label == WorkerLabel::Slow
            && self.state == SessionState::BothRunning
        {
            self.held.push_back(message);
            return out;
        }

        self.process(message, &mut out);
        out
    }

    /// End the session with an error raised by the orchestrator itself.
    pub fn fail(&mut self, message: impl Into<String>) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        if !self.is_terminal() {
            self.abort_with(WorkerLabel::Fast, message.into(), &mut out);
        }
        out
    }

    /// End the session silently because nobody is listening any more.
    pub fn client_disconnected(&mut self) {
        if !self.is_terminal() {
            tracing::info!("Client disconnected; aborting session");
            self.disconnected = true;
            self.held.clear();
            self.transition(SessionState::Aborted);
        }
    }

    fn abort_with(&mut self, label: WorkerLabel, message: String, out: &mut Vec<StreamEvent>) {
        tracing::warn!("Aborting session on {} error: {}", label, message);
        self.held.clear();
        self.error = Some(message.clone());
        out.push(StreamEvent::new(label, EventPayload::Error { message }));
        self.transition(SessionState::Aborted);
    }

    fn process(&mut self, message: WorkerMessage, out: &mut Vec<StreamEvent>) {
        let label = message.label;
        match message.kind {
            WorkerMessageKind::Event(raw) => {
                let payloads = self.adapters.entry(label).or_default().adapt(raw);
                for payload in payloads {
                    match payload {
                        EventPayload::Error { message } => {
                            self.abort_with(label, message, out);
                            return;
                        }
                        EventPayload::TextDelta { content } => {
                            self.texts.entry(label).or_default().push_str(&content);
                            let phases = self.detector.observe(label, &content);
                            out.push(StreamEvent::new(label, EventPayload::TextDelta { content }));
                            for phase in phases {
                                if let EventPayload::Phase { phase: id } = &phase {
                                    self.phases.push(id.clone());
                                }
                                out.push(StreamEvent::new(label, phase));
                            }
                        }
                        other => out.push(StreamEvent::new(label, other)),
                    }
                }
            }
            WorkerMessageKind::Done {
                elapsed_secs,
                model,
            } => self.worker_done(label, elapsed_secs, model, out),
            WorkerMessageKind::Error { message } => self.abort_with(label, message, out),
        }
    }

    fn worker_done(
        &mut self,
        label: WorkerLabel,
        elapsed_secs: f64,
        model: String,
        out: &mut Vec<StreamEvent>,
    ) {
        self.elapsed.insert(label, elapsed_secs);

        if !self.dual {
            out.push(StreamEvent::new(
                label,
                EventPayload::SessionDone {
                    fast_elapsed_secs: None,
                    slow_elapsed_secs: elapsed_secs,
                    model,
                },
            ));
            self.transition(SessionState::SessionDone);
            return;
        }

        match label {
            WorkerLabel::Fast => {
                self.transition(SessionState::FastDoneBufferingSlow);
                out.push(StreamEvent::new(
                    label,
                    EventPayload::WorkerDone {
                        elapsed_secs,
                        model,
                    },
                ));

                self.transition(SessionState::FlushingSlowBuffer);
                tracing::debug!("Replaying {} held slow messages", self.held.len());
                while let Some(held) = self.held.pop_front() {
                    self.process(held, out);
                    if self.is_terminal() {
                        return;
                    }
                }
                self.transition(SessionState::SlowLiveOnly);
            }
            WorkerLabel::Slow => {
                out.push(StreamEvent::new(
                    label,
                    EventPayload::SessionDone {
                        fast_elapsed_secs: self.elapsed.get(&WorkerLabel::Fast).copied(),
                        slow_elapsed_secs: elapsed_secs,
                        model,
                    },
                ));
                self.transition(SessionState::SessionDone);
            }
        }
    }

    /// Consume the machine into a session outcome.
    pub fn into_outcome(mut self, events_delivered: usize) -> AnalysisOutcome {
        let (fast_elapsed_secs, slow_elapsed_secs) = if self.dual {
            (
                self.elapsed.get(&WorkerLabel::Fast).copied(),
                self.elapsed.get(&WorkerLabel::Slow).copied(),
            )
        } else {
            (None, self.elapsed.get(&WorkerLabel::Fast).copied())
        };
        AnalysisOutcome {
            state: self.state,
            transitions: self.transitions,
            fast_text: self.texts.remove(&WorkerLabel::Fast).unwrap_or_default(),
            slow_text: self.texts.remove(&WorkerLabel::Slow).unwrap_or_default(),
            fast_elapsed_secs,
            slow_elapsed_secs,
            error: self.error,
            disconnected: self.disconnected,
            phases: self.phases,
            events_delivered,
        }
    }
}

/// Runs sessions against one provider
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: OrchestratorConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn detector(&self) -> PhaseDetector {
        PhaseDetector::new(
            DEFAULT_MARKERS.to_vec(),
            self.config.phase_window_capacity,
            self.config.phase_window_tail,
        )
    }

    /// Run one session to a terminal state, delivering events to `sink`.
    ///
    /// Every worker task is finished or aborted before this returns.
    pub async fn run<S: EventSink + ?Sized>(&self, plan: WorkerPlan, sink: &mut S) -> AnalysisOutcome {
        let mut machine = SessionMachine::new(plan.is_dual(), self.detector());
        let (tx, mut rx) = mpsc::channel::<WorkerMessage>(self.config.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for spec in plan.into_specs() {
            tasks.spawn(run_worker(
                Arc::clone(&self.provider),
                spec,
                tx.clone(),
                cancel.child_token(),
            ));
        }
        drop(tx);

        let mut delivered = 0usize;
        let mut last_activity = Instant::now();

        while !machine.is_terminal() {
            if sink.is_closed() {
                machine.client_disconnected();
                break;
            }

            let events = match tokio::time::timeout(self.config.poll_interval, rx.recv()).await {
                Ok(Some(message)) => {
                    last_activity = Instant::now();
                    machine.handle(message)
                }
                Ok(None) => machine.fail("Analysis workers stopped before finishing"),
                Err(_) => self.idle_tick(&mut machine, &mut tasks, last_activity),
            };

            for event in events {
                if !sink.deliver(event).await {
                    machine.client_disconnected();
                    break;
                }
                delivered += 1;
            }
        }

        cancel.cancel();
        drop(rx);
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}

        let outcome = machine.into_outcome(delivered);
        tracing::info!(
            "Session ended in {:?} after {} events (fast={:?}s, slow={:?}s)",
            outcome.state,
            outcome.events_delivered,
            outcome.fast_elapsed_secs,
            outcome.slow_elapsed_secs
        );
        outcome
    }

    /// Reap finished tasks and enforce the idle timeout.
    fn idle_tick(
        &self,
        machine: &mut SessionMachine,
        tasks: &mut JoinSet<()>,
        last_activity: Instant,
    ) -> Vec<StreamEvent> {
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                if e.is_panic() {
                    tracing::error!("Analysis worker panicked");
                    return machine.fail("Analysis worker crashed");
                }
            }
        }

        let idle = last_activity.elapsed();
        if idle >= self.config.idle_timeout {
            return machine.fail(format!(
                "No model output for {} seconds",
                idle.as_secs()
            ));
        }
        Vec::new()
    }
}
