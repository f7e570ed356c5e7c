//! Integration tests for the AgentEngine and the assembled runtime.
//!
//! These tests use a MockLlmClient that returns configurable responses,
//! allowing us to test full decision cycles without real LLM calls.

use anyhow::Result;
use async_trait::async_trait;
use canis_core::config::LlmConfig;
use canis_core::state::PetState;
use canis_core::{
    CanisConfig, Clock, CycleOrigin, CycleRequest, DecisionMaker, ManualClock, MemoryStore,
    NeedDynamics, NullAssets, StateStore, SystemClock, TimeScale,
};
use canis_limbic::StateManager;
use canis_reasoning::api_types::{ContentBlock, Message, MessagesResponse, Role, Tool};
use canis_reasoning::engine::AgentEngine;
use canis_reasoning::interaction::InteractionTimer;
use canis_reasoning::llm::{CompletionParams, LlmClient};
use canis_reasoning::providers::MockProvider;
use canis_reasoning::queue::{ExecutionQueue, QueueTiming};
use canis_reasoning::tool_registry::ToolRegistry;
use canis_reasoning::tools::register_behavior_tools;
use canis_reasoning::PetRuntime;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// A mock LLM client that returns a sequence of pre-configured responses.
/// Each call to `complete()` pops the next response from the queue.
/// If the queue is exhausted, returns an empty text response.
struct MockLlmClient {
    responses: Mutex<Vec<MessagesResponse>>,
    seen: Mutex<Vec<(String, Vec<Message>)>>,
    call_count: AtomicUsize,
}

impl MockLlmClient {
    fn new(responses: Vec<MessagesResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            seen: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        _tools: Vec<Tool>,
        _params: CompletionParams,
    ) -> Result<MessagesResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().await.push((system.to_string(), messages));
        let mut queue = self.responses.lock().await;
        if queue.is_empty() {
            Ok(MessagesResponse::text(""))
        } else {
            Ok(queue.remove(0))
        }
    }
}

fn tool_calls(calls: &[(&str, serde_json::Value)]) -> MessagesResponse {
    MessagesResponse {
        content: calls
            .iter()
            .enumerate()
            .map(|(i, (name, input))| ContentBlock::ToolUse {
                id: format!("call_{i}"),
                name: name.to_string(),
                input: input.clone(),
            })
            .collect(),
        stop_reason: Some("tool_calls".into()),
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    engine: AgentEngine,
    state: Arc<StateManager>,
    queue: ExecutionQueue,
    clock: Arc<ManualClock>,
    running: Arc<AtomicBool>,
}

fn harness(client: Arc<dyn LlmClient>) -> Harness {
    let clock = Arc::new(ManualClock::default());
    let state = Arc::new(StateManager::new(
        PetState::new(clock.now()),
        Arc::new(MemoryStore::new()),
        clock.clone(),
        NeedDynamics::default(),
        TimeScale::new(60.0).unwrap(),
    ));
    let running = Arc::new(AtomicBool::new(true));
    let (queue, worker) = ExecutionQueue::new(
        state.clone(),
        Arc::new(NullAssets),
        Arc::new(InteractionTimer::new(clock.clone())),
        running.clone(),
        QueueTiming {
            idle_wait: Duration::from_millis(10),
            completion_poll: Duration::from_millis(10),
            error_backoff: Duration::from_millis(10),
        },
    );
    worker.spawn();

    let mut registry = ToolRegistry::new();
    register_behavior_tools(&mut registry, state.clone(), queue.clone());
    let engine = AgentEngine::new(client, Arc::new(registry), &LlmConfig::default());

    Harness {
        engine,
        state,
        queue,
        clock,
        running,
    }
}

fn request(origin: CycleOrigin, utterance: Option<&str>) -> CycleRequest {
    CycleRequest {
        origin,
        state_description: "Current internal state:\n- overall feeling: content".into(),
        utterance: utterance.map(str::to_string),
    }
}

async fn wait_for<F, Fut>(mut cond: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if cond().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// ============================================================================
// Engine
// ============================================================================

#[tokio::test]
async fn test_text_only_reply() {
    let client = Arc::new(MockLlmClient::new(vec![MessagesResponse::text("Woof!")]));
    let h = harness(client.clone());

    let out = h
        .engine
        .decide(request(CycleOrigin::Interactive, Some("hello")))
        .await
        .unwrap();
    assert_eq!(out.text, "Woof!");
    assert!(out.behaviors.is_empty());
    assert_eq!(client.calls(), 1);

    let seen = client.seen.lock().await;
    let (system, messages) = &seen[0];
    assert!(system.contains("Mode: interactive"));
    assert!(messages[0].text().ends_with("Owner's action/command: hello"));
    h.running.store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn test_tool_calls_are_enqueued_in_order() {
    let client = Arc::new(MockLlmClient::new(vec![
        tool_calls(&[
            ("wag_tail", json!({"duration_seconds": 5})),
            ("sniff_ground", json!({"duration_seconds": 15})),
        ]),
        MessagesResponse::text("*sniff sniff*"),
    ]));
    let h = harness(client.clone());
    let before = h.state.snapshot().await;

    let out = h
        .engine
        .decide(request(CycleOrigin::Autonomous, None))
        .await
        .unwrap();
    assert_eq!(out.behaviors, vec!["wag_tail", "sniff_ground"]);
    assert_eq!(out.text, "*sniff sniff*");
    assert_eq!(client.calls(), 2);

    // Second call carries the tool results back to the model
    let seen = client.seen.lock().await;
    let last = seen[1].1.last().unwrap();
    assert_eq!(last.role, Role::User);
    match &last.content[0] {
        ContentBlock::ToolResult { content, is_error, .. } => {
            assert_eq!(content, "✓ wagging tail");
            assert!(is_error.is_none());
        }
        other => panic!("Expected ToolResult, got {:?}", other),
    }
    drop(seen);

    let state = h.state.clone();
    assert!(
        wait_for(|| {
            let state = state.clone();
            async move { state.snapshot().await.boredom < before.boredom }
        })
        .await
    );
    let after = h.state.snapshot().await;
    assert_eq!(after.happiness, before.happiness + 5.0);
    assert_eq!(after.boredom, before.boredom - 8.0);
    h.running.store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn test_unknown_tools_abort_after_repeated_failures() {
    let client = Arc::new(MockLlmClient::new(vec![
        tool_calls(&[("fly", json!({}))]),
        tool_calls(&[("fly", json!({}))]),
        tool_calls(&[("fly", json!({}))]),
    ]));
    let h = harness(client.clone());

    let out = h
        .engine
        .decide(request(CycleOrigin::Autonomous, None))
        .await
        .unwrap();
    assert!(out.behaviors.is_empty());
    assert_eq!(client.calls(), 2);
    h.running.store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn test_tool_rounds_are_bounded() {
    let responses = (0..10)
        .map(|_| tool_calls(&[("bark", json!({"duration_seconds": 2}))]))
        .collect();
    let client = Arc::new(MockLlmClient::new(responses));
    let h = harness(client.clone());

    let out = h
        .engine
        .decide(request(CycleOrigin::Autonomous, None))
        .await
        .unwrap();
    let rounds = LlmConfig::default().max_tool_rounds;
    assert_eq!(client.calls(), rounds);
    assert_eq!(out.behaviors.len(), rounds);
    assert!(out.text.is_empty());
    h.running.store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn test_history_carries_across_cycles() {
    let client = Arc::new(MockLlmClient::new(vec![
        MessagesResponse::text("first"),
        MessagesResponse::text("second"),
    ]));
    let h = harness(client.clone());

    h.engine
        .decide(request(CycleOrigin::Interactive, Some("sit")))
        .await
        .unwrap();
    h.engine
        .decide(request(CycleOrigin::Interactive, Some("stay")))
        .await
        .unwrap();

    let seen = client.seen.lock().await;
    let replay = &seen[1].1;
    assert_eq!(replay.len(), 3);
    assert_eq!(replay[1].text(), "first");
    assert_eq!(h.engine.history().await.len(), 4);
    h.running.store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn test_sleep_call_blocks_queue_until_done() {
    let client = Arc::new(MockLlmClient::new(vec![tool_calls(&[
        ("sleep", json!({"duration_seconds": 3600})),
        ("wag_tail", json!({"duration_seconds": 5})),
    ])]));
    let h = harness(client);
    let happiness = h.state.snapshot().await.happiness;

    h.engine
        .decide(request(CycleOrigin::Autonomous, None))
        .await
        .unwrap();

    let state = h.state.clone();
    assert!(
        wait_for(|| {
            let state = state.clone();
            async move { state.is_busy().await }
        })
        .await
    );
    assert_eq!(h.queue.pending(), 1);
    assert_eq!(h.state.snapshot().await.happiness, happiness);

    // 60 virtual minutes at 60x
    h.clock.advance_secs(61.0);
    let queue = h.queue.clone();
    assert!(
        wait_for(|| {
            let queue = queue.clone();
            async move { queue.pending() == 0 && queue.executing().is_none() }
        })
        .await
    );
    let after = h.state.snapshot().await;
    assert_eq!(after.fatigue, 0.0);
    assert!(after.happiness > 0.0);
    h.running.store(false, Ordering::SeqCst);
}

// ============================================================================
// Runtime
// ============================================================================

#[tokio::test]
async fn test_runtime_with_mock_provider_and_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("canis.db");

    let mut config = CanisConfig::default();
    config.timing.tick_interval_secs = 0.05;
    config.timing.queue_idle_secs = 0.02;

    let store: Arc<dyn StateStore> =
        Arc::new(canis_memory::SqliteStore::new(db.to_str().unwrap()).await.unwrap());
    let state = Arc::new(
        StateManager::load(
            store.clone(),
            Arc::new(SystemClock),
            NeedDynamics::default(),
            TimeScale::new(config.simulation.time_scale).unwrap(),
        )
        .await
        .unwrap(),
    );

    let runtime = PetRuntime::start(
        state,
        Arc::new(MockProvider::new("mock")),
        Arc::new(NullAssets),
        &config,
    );
    let reply = runtime
        .orchestrator
        .handle_user_input("come here")
        .await
        .unwrap();
    assert!(reply.contains("Woof"));

    let transcript = runtime.orchestrator.transcript();
    assert_eq!(transcript.len(), 2);
    runtime.shutdown().await.unwrap();

    let saved = store.load_state().await.unwrap();
    assert!(saved.is_some());
}
