//! Analysis Service Integration Tests
//!
//! Session lifecycle from registration to the parsed report.

use std::sync::Arc;

use clausewise::models::clause::RiskTier;
use clausewise::models::session::{AnalysisConfig, AnalysisMode, SessionRecord};
use clausewise::models::settings::AnalysisSettings;
use clausewise::services::analysis::{AnalysisService, WireFrame};
use clausewise::services::registry::DocumentRegistry;
use clausewise::utils::error::AppError;
use clausewise_llm::ClaudeApiEvent;
use futures_util::StreamExt;

use super::common::*;

const IDENTIFICATION: &str = "\
CLAUSE: Automatic Renewal (§3.1) | RISK: YELLOW | SCORE: 55 | TRICK: Auto-Renewal Trap
CLAUSE: Early Termination Fee (§7) | RISK: RED | SCORE: 88 | TRICK: Penalty Disguise
GREEN_CLAUSES: §1: Parties identified; §9: Mutual confidentiality

## Document Profile
Residential lease, 12 months.
";

const CARDS: &str = "\
### Automatic Renewal (§3.1)
> This Agreement renews for successive terms unless cancelled 90 days prior.
**What it says:** The lease renews by itself.
**Worst case:** Locked in for another year.

---

### Early Termination Fee (§7)
RISK: RED | SCORE: 92 | TRICK: Penalty Disguise
**What it means for you:** Leaving early costs three months of rent.

---

### Fair Clauses Summary
Everything else is standard.

## Overall Assessment
Negotiate section 7.
";

fn settings() -> AnalysisSettings {
    AnalysisSettings {
        fast_model: FAST_MODEL.to_string(),
        slow_model: SLOW_MODEL.to_string(),
        poll_interval_ms: 20,
        ..Default::default()
    }
}

fn chunked(text: &str, size: usize) -> Vec<Step> {
    let chars: Vec<char> = text.chars().collect();
    let mut steps = vec![Step::Emit(ClaudeApiEvent::block_start("text"))];
    for chunk in chars.chunks(size) {
        steps.push(Step::Emit(ClaudeApiEvent::text(chunk.iter().collect::<String>())));
    }
    steps.push(Step::Emit(ClaudeApiEvent::block_stop()));
    steps
}

fn service(provider: ScriptedProvider) -> AnalysisService {
    AnalysisService::new(DocumentRegistry::new(), Arc::new(provider), settings())
}

fn lease_document() -> SessionRecord {
    SessionRecord::single("The tenant agrees to the following terms.", AnalysisConfig::default())
        .unwrap()
}

#[tokio::test]
async fn test_stream_session_produces_report_and_clears_registry() {
    let provider = ScriptedProvider::new()
        .with_script(FAST_MODEL, chunked(IDENTIFICATION, 7))
        .with_script(SLOW_MODEL, chunked(CARDS, 11));
    let service = service(provider);
    let id = service.create_session(lease_document());
    assert!(service.registry().contains(&id));

    let (frames, report) = service.stream_session(&id).unwrap().into_parts();
    let frames: Vec<WireFrame> = frames
        .map(|bytes| WireFrame::parse(std::str::from_utf8(&bytes).unwrap()).unwrap())
        .collect()
        .await;
    let report = report.await.unwrap();

    assert!(!service.registry().contains(&id));
    assert_eq!(frames.last().unwrap().frame_type, "done");
    assert_eq!(frames.iter().filter(|f| f.frame_type == "fast_done").count(), 1);

    assert_eq!(report.session_id, id);
    assert_eq!(report.identification.clauses.len(), 2);
    assert_eq!(report.identification.green_clauses.len(), 2);
    assert!(report.identification.profile.starts_with("## Document Profile"));

    assert_eq!(report.cards.len(), 3);
    assert_eq!(report.claims.len(), 2);
    let renewal = report.claims[0].assessment.unwrap();
    assert_eq!(renewal.tier, RiskTier::Yellow);
    assert_eq!(renewal.score, Some(55));
    let termination = report.claims[1].assessment.unwrap();
    assert_eq!(termination.score, Some(92));
    assert!(report.claims_summary.starts_with("FLAGGED CLAUSES (2)"));
}

#[tokio::test]
async fn test_disconnect_clears_registry() {
    let mut slow = chunked(CARDS, 11);
    slow.push(Step::Stall);
    let provider = ScriptedProvider::new()
        .with_script(FAST_MODEL, vec![Step::Stall])
        .with_script(SLOW_MODEL, slow);
    let service = service(provider);
    let id = service.create_session(lease_document());

    let stream = service.stream_session(&id).unwrap();
    drop(stream.frames);
    let report = stream.report.await.unwrap();

    assert!(report.outcome.disconnected);
    assert!(report.outcome.error.is_none());
    assert!(!service.registry().contains(&id));
}

#[tokio::test]
async fn test_session_streams_only_once() {
    let provider = ScriptedProvider::new()
        .with_script(FAST_MODEL, vec![Step::Stall])
        .with_script(SLOW_MODEL, vec![Step::Stall]);
    let service = service(provider);
    let id = service.create_session(lease_document());

    let first = service.stream_session(&id).unwrap();
    assert!(!service.registry().contains(&id));
    let second = service.stream_session(&id).err().unwrap();
    assert!(matches!(second, AppError::NotFound(_)));

    drop(first.frames);
    let report = first.report.await.unwrap();
    assert!(report.outcome.disconnected);
}

#[tokio::test]
async fn test_provider_error_clears_registry() {
    let service = service(ScriptedProvider::new());
    let id = service.create_session(lease_document());

    let (frames, report) = service.stream_session(&id).unwrap().into_parts();
    let frames: Vec<_> = frames.collect().await;
    let report = report.await.unwrap();

    assert_eq!(frames.len(), 1);
    let frame = WireFrame::parse(std::str::from_utf8(&frames[0]).unwrap()).unwrap();
    assert_eq!(frame.frame_type, "error");
    assert!(report.outcome.error.is_some());
    assert!(report.claims.is_empty());
    assert!(!service.registry().contains(&id));
}

#[tokio::test]
async fn test_run_session_with_channel_sink() {
    let provider = ScriptedProvider::new()
        .with_script(FAST_MODEL, chunked(IDENTIFICATION, 40))
        .with_script(SLOW_MODEL, chunked(CARDS, 40));
    let service = service(provider);
    let id = service.create_session(lease_document());

    let (tx, rx) = tokio::sync::mpsc::channel(256);
    let mut sink = tx;
    let report = service.run_session(&id, &mut sink).await.unwrap();
    drop(sink);
    let events = drain(rx).await;

    assert!(report.outcome.is_complete());
    assert_eq!(report.outcome.events_delivered, events.len());
    assert!(!service.registry().contains(&id));
}

#[tokio::test]
async fn test_comparison_session_runs_one_worker() {
    let provider = ScriptedProvider::new().with_script(
        SLOW_MODEL,
        chunked("CLAUSE: Rent Increase (§4) | RISK: RED | SCORE: 70\nRent rises 10%.", 9),
    );
    let service = service(provider);
    let session =
        SessionRecord::comparison("Rent is $1000.", "Rent is $1100.", AnalysisConfig::default())
            .unwrap();
    let id = service.create_session(session);

    let (frames, report) = service.stream_session(&id).unwrap().into_parts();
    let frames: Vec<WireFrame> = frames
        .map(|bytes| WireFrame::parse(std::str::from_utf8(&bytes).unwrap()).unwrap())
        .collect()
        .await;
    let report = report.await.unwrap();

    assert_eq!(report.mode, AnalysisMode::Compare);
    assert!(!frames.iter().any(|f| f.frame_type == "fast_done"));
    let done: serde_json::Value = serde_json::from_str(&frames.last().unwrap().content).unwrap();
    assert!(done["fast_elapsed"].is_null());
    assert_eq!(report.identification.clauses.len(), 1);
    assert!(report.cards.is_empty());
    assert!(report.claims_summary.is_empty());
}

#[tokio::test]
async fn test_unknown_session_rejected() {
    let service = service(ScriptedProvider::new());
    let err = service.stream_session("no-such-session").err().unwrap();
    assert!(matches!(err, AppError::NotFound(_)));
}
