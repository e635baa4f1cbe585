//! Dual-Stream Orchestrator Integration Tests
//!
//! Drives the orchestrator end-to-end with scripted providers.

use std::sync::Arc;
use std::time::Duration;

use clausewise::services::analysis::{SessionState, SseSink, WireFrame, WorkerPlan};
use clausewise_core::streaming::{EventPayload, StreamEvent, WorkerLabel};
use clausewise_llm::{ClaudeApiEvent, LlmError};
use tokio::sync::mpsc;

use super::common::*;

fn dual_plan() -> WorkerPlan {
    WorkerPlan::Dual {
        fast: request(FAST_MODEL),
        slow: request(SLOW_MODEL),
    }
}

fn fast_script() -> Vec<Step> {
    vec![
        Step::Emit(ClaudeApiEvent::block_start("text")),
        wait_ms(30),
        Step::Emit(ClaudeApiEvent::text(
            "CLAUSE: Late Fees (§5) | RISK: RED | SCORE: 85 | TRICK: Penalty Disguise\n",
        )),
        wait_ms(30),
        Step::Emit(ClaudeApiEvent::text("GREEN_CLAUSES: §1: Parties\n## Document Profile\nLease")),
        Step::Emit(ClaudeApiEvent::block_stop()),
    ]
}

fn slow_script() -> Vec<Step> {
    vec![
        Step::Emit(ClaudeApiEvent::block_start("thinking")),
        Step::Emit(ClaudeApiEvent::thinking("Reading section 5")),
        Step::Emit(ClaudeApiEvent::block_stop()),
        Step::Emit(ClaudeApiEvent::block_start("text")),
        Step::Emit(ClaudeApiEvent::text("### Late Fees (§5)\nRISK: RED | SCORE: 85\n")),
        Step::Emit(ClaudeApiEvent::text("**Worst case:** $900 in fees\n---\n## Overall Assessment\nRisky")),
        Step::Emit(ClaudeApiEvent::block_stop()),
    ]
}

fn scripted(fast: Vec<Step>, slow: Vec<Step>) -> Arc<ScriptedProvider> {
    Arc::new(
        ScriptedProvider::new()
            .with_script(FAST_MODEL, fast)
            .with_script(SLOW_MODEL, slow),
    )
}

#[tokio::test]
async fn test_fast_output_precedes_all_slow_output() {
    let provider = scripted(fast_script(), slow_script());
    let (outcome, events) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    assert_eq!(outcome.state, SessionState::SessionDone);
    assert!(outcome.is_complete());

    let fast_done = events
        .iter()
        .position(is_worker_done)
        .expect("fast_done emitted");
    assert!(events[..fast_done].iter().all(|e| e.source == WorkerLabel::Fast));
    assert!(events[fast_done + 1..].iter().all(|e| e.source == WorkerLabel::Slow));
    assert_eq!(events.iter().filter(|e| is_worker_done(e)).count(), 1);

    let last = events.last().unwrap();
    assert!(matches!(last.payload, EventPayload::SessionDone { .. }));
    let terminal = events
        .iter()
        .filter(|e| matches!(e.payload, EventPayload::Error { .. } | EventPayload::SessionDone { .. }))
        .count();
    assert_eq!(terminal, 1);
}

#[tokio::test]
async fn test_state_transitions_in_order() {
    let mut slow = slow_script();
    slow.insert(slow.len() - 1, wait_ms(200));
    let provider = scripted(fast_script(), slow);
    let (outcome, _) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    assert_eq!(
        outcome.transitions,
        vec![
            SessionState::BothRunning,
            SessionState::FastDoneBufferingSlow,
            SessionState::FlushingSlowBuffer,
            SessionState::SlowLiveOnly,
            SessionState::SessionDone,
        ]
    );
}

#[tokio::test]
async fn test_slow_events_keep_their_order() {
    let provider = scripted(fast_script(), slow_script());
    let (_, events) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    let slow_kinds: Vec<&str> = events
        .iter()
        .filter(|e| e.source == WorkerLabel::Slow)
        .map(|e| e.payload.kind())
        .collect();
    let first_text = slow_kinds.iter().position(|k| *k == "text_delta").unwrap();
    let thinking = slow_kinds.iter().position(|k| *k == "reasoning_delta").unwrap();
    assert!(thinking < first_text);
    assert_eq!(slow_kinds.last(), Some(&"session_done"));
}

#[tokio::test]
async fn test_phases_emitted_once_in_stream_order() {
    let provider = scripted(fast_script(), slow_script());
    let (outcome, _) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    assert_eq!(
        outcome.phases,
        vec!["identifying", "scoring", "green_scan", "profile", "assessment"]
    );
}

#[tokio::test]
async fn test_texts_accumulated_per_worker() {
    let provider = scripted(fast_script(), slow_script());
    let (outcome, _) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    assert!(outcome.fast_text.starts_with("CLAUSE: Late Fees"));
    assert!(outcome.slow_text.starts_with("### Late Fees"));
    assert!(!outcome.slow_text.contains("Reading section 5"));
    assert!(outcome.fast_elapsed_secs.is_some());
    assert!(outcome.slow_elapsed_secs.is_some());
}

#[tokio::test]
async fn test_slow_error_while_fast_running_ends_session() {
    let mut fast = vec![wait_ms(200)];
    fast.extend(text_block("CLAUSE: Never delivered (§1)\n"));
    let slow = vec![
        Step::Emit(ClaudeApiEvent::block_start("text")),
        Step::Fail(LlmError::ServerError {
            message: "overloaded".to_string(),
            status: Some(529),
        }),
    ];
    let provider = scripted(fast, slow);
    let (outcome, events) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    assert_eq!(outcome.state, SessionState::Aborted);
    let reported = errors(&events);
    assert_eq!(reported.len(), 1);
    assert!(reported[0].contains("overloaded"));
    assert!(matches!(
        events.last().unwrap().payload,
        EventPayload::Error { .. }
    ));
    assert!(!events.iter().any(|e| matches!(e.payload, EventPayload::SessionDone { .. })));
}

#[tokio::test]
async fn test_fast_error_ends_session() {
    let fast = vec![Step::Fail(LlmError::RateLimited {
        message: "slow down".to_string(),
        retry_after: Some(5),
    })];
    let provider = scripted(fast, slow_script());
    let (outcome, events) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    assert_eq!(outcome.state, SessionState::Aborted);
    assert_eq!(errors(&events).len(), 1);
    assert!(outcome.error.unwrap().contains("slow down"));
    // Held slow output is discarded, never flushed after the error
    assert!(labels(&events).iter().all(|l| *l == WorkerLabel::Fast));
}

#[tokio::test]
async fn test_in_band_provider_error_ends_session() {
    let mut fast = text_block("CLAUSE: A (§1)\n");
    fast.push(Step::Emit(
        serde_json::from_str(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .unwrap(),
    ));
    let provider = scripted(fast, slow_script());
    let (outcome, events) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    assert_eq!(outcome.state, SessionState::Aborted);
    assert_eq!(errors(&events), vec!["Overloaded"]);
}

#[tokio::test]
async fn test_unknown_model_reported_as_error() {
    let provider = Arc::new(ScriptedProvider::new().with_script(FAST_MODEL, fast_script()));
    let (outcome, events) = run_collect(orchestrator(provider, fast_config()), dual_plan()).await;

    assert_eq!(outcome.state, SessionState::Aborted);
    let reported = errors(&events);
    assert_eq!(reported.len(), 1);
    assert!(reported[0].contains(SLOW_MODEL));
}

#[tokio::test]
async fn test_idle_timeout_aborts_stalled_session() {
    let provider = scripted(vec![Step::Stall], vec![Step::Stall]);
    let mut config = fast_config();
    config.idle_timeout = Duration::from_millis(150);

    let (outcome, events) = run_collect(orchestrator(Arc::clone(&provider), config), dual_plan()).await;

    assert_eq!(outcome.state, SessionState::Aborted);
    let reported = errors(&events);
    assert_eq!(reported.len(), 1);
    assert!(reported[0].contains("No model output"));
    assert!(provider.wait_released(2).await);
}

#[tokio::test]
async fn test_client_disconnect_cancels_workers() {
    let mut fast = text_block("CLAUSE: A (§1)\n");
    fast.push(Step::Stall);
    let provider = scripted(fast, vec![Step::Stall]);
    let orchestrator = orchestrator(Arc::clone(&provider), fast_config());

    let (tx, mut rx) = mpsc::channel::<StreamEvent>(1);
    let handle = tokio::spawn(async move {
        let mut sink = tx;
        orchestrator.run(dual_plan(), &mut sink).await
    });

    let first = rx.recv().await.unwrap();
    assert_eq!(first.source, WorkerLabel::Fast);
    drop(rx);

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("orchestrator stopped after disconnect")
        .unwrap();
    assert!(outcome.disconnected);
    assert_eq!(outcome.state, SessionState::Aborted);
    assert!(outcome.error.is_none());
    assert_eq!(provider.opened(), 2);
    assert!(provider.wait_released(2).await);
}

#[tokio::test]
async fn test_single_worker_forwarded_live() {
    let provider = Arc::new(
        ScriptedProvider::new().with_script(SLOW_MODEL, text_block("CLAUSE: Term changed (§2)\n")),
    );
    let plan = WorkerPlan::Single(request(SLOW_MODEL));
    let (outcome, events) = run_collect(orchestrator(provider, fast_config()), plan).await;

    assert_eq!(outcome.state, SessionState::SessionDone);
    assert!(!events.iter().any(is_worker_done));
    match &events.last().unwrap().payload {
        EventPayload::SessionDone {
            fast_elapsed_secs,
            model,
            ..
        } => {
            assert!(fast_elapsed_secs.is_none());
            assert_eq!(model, SLOW_MODEL);
        }
        other => panic!("expected session done, got {:?}", other),
    }
    assert!(outcome.fast_text.contains("Term changed"));
}

#[tokio::test]
async fn test_wire_frames_through_sse_sink() {
    let provider = scripted(fast_script(), slow_script());
    let orchestrator = orchestrator(provider, fast_config());

    let (tx, mut rx) = mpsc::channel(64);
    let handle = tokio::spawn(async move {
        let mut sink = SseSink::new(tx);
        orchestrator.run(dual_plan(), &mut sink).await
    });

    let mut frames = Vec::new();
    while let Some(bytes) = rx.recv().await {
        let text = std::str::from_utf8(&bytes).unwrap().to_string();
        assert!(text.starts_with("data: ") && text.ends_with("\n\n"));
        frames.push(WireFrame::parse(&text).unwrap());
    }
    handle.await.unwrap();

    let types: Vec<&str> = frames.iter().map(|f| f.frame_type.as_str()).collect();
    assert_eq!(types.first(), Some(&"text_start"));
    assert_eq!(types.last(), Some(&"done"));

    let fast_done = types.iter().position(|t| *t == "fast_done").unwrap();
    let thinking_start = types.iter().position(|t| *t == "thinking_start").unwrap();
    assert!(fast_done < thinking_start);

    let done: serde_json::Value = serde_json::from_str(&frames.last().unwrap().content).unwrap();
    assert!(done["fast_elapsed"].is_number());
    assert_eq!(done["model"], SLOW_MODEL);

    let phases: Vec<&str> = frames
        .iter()
        .filter(|f| f.frame_type == "phase")
        .map(|f| f.content.as_str())
        .collect();
    assert_eq!(phases.first(), Some(&"identifying"));
}
