//! Analysis
//!
//! Dual-stream contract analysis: two model workers run concurrently, their
//! events are normalized, tagged with phases and emitted as one ordered
//! stream in which all fast output precedes all slow output.

pub mod orchestrator;
pub mod phase;
pub mod prompts;
pub mod service;
pub mod sse;
pub mod worker;

pub use orchestrator::{
    AnalysisOutcome, EventSink, Orchestrator, OrchestratorConfig, SessionMachine, SessionState,
    WorkerPlan,
};
pub use phase::{PhaseDetector, PhaseMarker, DEFAULT_MARKERS};
pub use service::{AnalysisReport, AnalysisService, AnalysisStream};
pub use sse::{encode, encode_frame, to_wire, SseSink, WireFrame};
pub use worker::{run_worker, WorkerMessage, WorkerMessageKind, WorkerSpec};
