//! Analysis Service
//!
//! Entry point used by collaborators: registers sessions, chooses the worker
//! topology, streams the session and parses the finished output into a
//! report.

use std::sync::Arc;

use bytes::Bytes;
use clausewise_llm::{LlmProvider, ModelRequest};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use super::orchestrator::{AnalysisOutcome, EventSink, Orchestrator, OrchestratorConfig, WorkerPlan};
use super::prompts;
use super::sse::SseSink;
use crate::models::clause::ClauseRecord;
use crate::models::session::{AnalysisMode, SessionRecord};
use crate::models::settings::AnalysisSettings;
use crate::services::clauses::{
    assemble_claims, parse_cards, parse_identification, render_claims_summary,
    IdentificationResult,
};
use crate::services::registry::{DocumentRegistry, SessionLease};
use crate::utils::error::{AppError, AppResult};

/// Structured result of a finished session
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub session_id: String,
    pub mode: AnalysisMode,
    pub outcome: AnalysisOutcome,
    /// Parsed fast-worker output (comparison output in comparison mode)
    pub identification: IdentificationResult,
    /// Parsed clause cards (single-document mode only)
    pub cards: Vec<ClauseRecord>,
    /// Cards joined with identification risk data
    pub claims: Vec<ClauseRecord>,
    /// Text block handed to later synthesis; empty when there are no claims
    pub claims_summary: String,
}

impl AnalysisReport {
    /// Parse the accumulated worker texts of a session.
    pub fn build(session: &SessionRecord, outcome: AnalysisOutcome) -> Self {
        let identification = parse_identification(&outcome.fast_text);
        let (cards, claims) = match session.mode {
            AnalysisMode::Single => {
                let cards = parse_cards(&outcome.slow_text);
                let claims = assemble_claims(&identification.clauses, &cards);
                (cards, claims)
            }
            AnalysisMode::Compare => (Vec::new(), Vec::new()),
        };
        let claims_summary = render_claims_summary(&claims);

        tracing::debug!(
            "Report for {}: {} identified, {} cards, {} claims",
            session.id,
            identification.clauses.len(),
            cards.len(),
            claims.len()
        );

        Self {
            session_id: session.id.clone(),
            mode: session.mode,
            outcome,
            identification,
            cards,
            claims,
            claims_summary,
        }
    }
}

/// A running session: encoded frames plus the eventual report
pub struct AnalysisStream {
    pub frames: mpsc::Receiver<Bytes>,
    pub report: JoinHandle<AnalysisReport>,
}

impl AnalysisStream {
    /// Frames as a `Stream`, for forwarding to a response body.
    pub fn into_parts(self) -> (ReceiverStream<Bytes>, JoinHandle<AnalysisReport>) {
        (ReceiverStream::new(self.frames), self.report)
    }
}

/// Analysis service shared across requests
#[derive(Clone)]
pub struct AnalysisService {
    registry: DocumentRegistry,
    orchestrator: Orchestrator,
    settings: AnalysisSettings,
}

impl AnalysisService {
    pub fn new(
        registry: DocumentRegistry,
        provider: Arc<dyn LlmProvider>,
        settings: AnalysisSettings,
    ) -> Self {
        let orchestrator = Orchestrator::new(provider, OrchestratorConfig::from(&settings));
        Self {
            registry,
            orchestrator,
            settings,
        }
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Register a session and return its id.
    pub fn create_session(&self, session: SessionRecord) -> String {
        self.registry.put(session)
    }

    /// Worker topology and requests for a session.
    pub fn plan(&self, session: &SessionRecord) -> AppResult<WorkerPlan> {
        let settings = &self.settings;
        let budget = session.config.depth.budget();

        match session.mode {
            AnalysisMode::Single => {
                let user_message = prompts::analysis_user_message(&session.document, &session.config);
                let fast = ModelRequest::new(
                    settings.fast_model.clone(),
                    prompts::identification_system_prompt(),
                    user_message.clone(),
                    settings.fast_max_tokens,
                );
                let slow = ModelRequest::new(
                    settings.slow_model.clone(),
                    prompts::card_system_prompt(),
                    user_message,
                    budget,
                )
                .with_thinking(settings.enable_thinking);
                Ok(WorkerPlan::Dual { fast, slow })
            }
            AnalysisMode::Compare => {
                let second = session.comparison_document.as_deref().ok_or_else(|| {
                    AppError::validation("Comparison session has no second document")
                })?;
                let request = ModelRequest::new(
                    settings.slow_model.clone(),
                    prompts::comparison_system_prompt(),
                    prompts::comparison_user_message(&session.document, second, &session.config),
                    budget,
                )
                .with_thinking(settings.enable_thinking);
                Ok(WorkerPlan::Single(request))
            }
        }
    }

    /// Stream a registered session into `sink` and return its report.
    ///
    /// The session leaves the registry before any worker starts, so each
    /// session is analyzed at most once.
    pub async fn run_session<S: EventSink + ?Sized>(
        &self,
        session_id: &str,
        sink: &mut S,
    ) -> AppResult<AnalysisReport> {
        let lease = self.registry.lease(session_id)?;
        let plan = self.plan(lease.session())?;
        Ok(self.run_leased(lease, plan, sink).await)
    }

    /// Start streaming a registered session as encoded SSE frames.
    ///
    /// Dropping the frame receiver aborts the session. The registry entry is
    /// consumed up front, as in [`Self::run_session`].
    pub fn stream_session(&self, session_id: &str) -> AppResult<AnalysisStream> {
        let lease = self.registry.lease(session_id)?;
        let plan = self.plan(lease.session())?;
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let service = self.clone();

        let report = tokio::spawn(async move {
            let mut sink = SseSink::new(tx);
            service.run_leased(lease, plan, &mut sink).await
        });

        Ok(AnalysisStream { frames: rx, report })
    }

    async fn run_leased<S: EventSink + ?Sized>(
        &self,
        lease: SessionLease,
        plan: WorkerPlan,
        sink: &mut S,
    ) -> AnalysisReport {
        let session = lease.session();
        tracing::info!(
            "Starting {:?} analysis {} (depth={}, {} chars)",
            session.mode,
            session.id,
            session.config.depth,
            session.document.len()
        );
        let outcome = self.orchestrator.run(plan, sink).await;
        AnalysisReport::build(session, outcome)
    }
}
