use crate::interaction::InteractionTimer;
use crate::queue::ExecutionQueue;
use anyhow::Result;
use canis_core::config::TimingConfig;
use canis_core::{Clock, CycleOrigin, CycleOutput, CycleRequest, DecisionMaker};
use canis_limbic::StateManager;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shown when an interactive cycle produced no text.
pub const PERFORMING_PLACEHOLDER: &str = "(performing behaviors...)";
/// Shown when an autonomous cycle did nothing visible.
pub const OBSERVING_PLACEHOLDER: &str = "(observing...)";

const TRANSCRIPT_CAPACITY: usize = 200;

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Owner,
    Dog,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub origin: CycleOrigin,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Chat-style log shared by both modes, oldest entries dropped first.
#[derive(Debug)]
pub struct Transcript {
    entries: VecDeque<TranscriptEntry>,
    capacity: usize,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::with_capacity(TRANSCRIPT_CAPACITY)
    }
}

impl Transcript {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Transcript text for an autonomous cycle.
pub fn autonomous_summary(output: &CycleOutput) -> String {
    let mut parts = Vec::new();
    if !output.behaviors.is_empty() {
        parts.push(format!("performed: {}", output.behaviors.join(", ")));
    }
    if !output.text.is_empty() {
        parts.push(output.text.clone());
    }
    if parts.is_empty() {
        OBSERVING_PLACEHOLDER.to_string()
    } else {
        parts.join("\n")
    }
}

/// Reply shown for an interactive cycle: the behaviors performed, then the
/// agent's text.
pub fn interactive_summary(output: &CycleOutput) -> String {
    let mut parts = Vec::new();
    if !output.behaviors.is_empty() {
        parts.push(format!("🐾 {}", output.behaviors.join(", ")));
    }
    if !output.text.trim().is_empty() {
        parts.push(output.text.clone());
    }
    if parts.is_empty() {
        PERFORMING_PLACEHOLDER.to_string()
    } else {
        parts.join("\n")
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// What a single tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// A long behavior occupies the slot.
    Busy,
    /// A behavior just finished but the owner was active recently.
    CompletionSuppressed,
    /// A behavior just finished and the dog decided what to do next.
    CompletionTriggered,
    /// Quiet long enough; the dog acted on its own.
    Autonomous,
    Idle,
}

/// Decides when the dog acts on its own and routes owner input.
pub struct Orchestrator {
    state: Arc<StateManager>,
    decider: Arc<dyn DecisionMaker>,
    timer: Arc<InteractionTimer>,
    queue: ExecutionQueue,
    transcript: Mutex<Transcript>,
    running: Arc<AtomicBool>,
    /// Serializes cycles so the agent never runs two at once.
    cycle_lock: tokio::sync::Mutex<()>,
    tick_interval: Duration,
    autonomous_interval: Duration,
    error_backoff: Duration,
}

impl Orchestrator {
    pub fn new(
        state: Arc<StateManager>,
        decider: Arc<dyn DecisionMaker>,
        timer: Arc<InteractionTimer>,
        queue: ExecutionQueue,
        running: Arc<AtomicBool>,
        timing: &TimingConfig,
    ) -> Self {
        Self {
            state,
            decider,
            timer,
            queue,
            transcript: Mutex::new(Transcript::default()),
            running,
            cycle_lock: tokio::sync::Mutex::new(()),
            tick_interval: timing.tick_interval(),
            autonomous_interval: timing.autonomous_interval(),
            error_backoff: timing.error_backoff(),
        }
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state
    }

    pub fn queue(&self) -> &ExecutionQueue {
        &self.queue
    }

    pub fn timer(&self) -> &Arc<InteractionTimer> {
        &self.timer
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the running flag; both loops exit within one poll interval.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock_transcript().entries()
    }

    fn lock_transcript(&self) -> std::sync::MutexGuard<'_, Transcript> {
        self.transcript.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, speaker: Speaker, origin: CycleOrigin, text: String) {
        let at = self.state.clock().now();
        self.lock_transcript().push(TranscriptEntry {
            speaker,
            origin,
            text,
            at,
        });
    }

    async fn run_cycle(
        &self,
        origin: CycleOrigin,
        utterance: Option<String>,
    ) -> Result<CycleOutput> {
        let _cycle = self.cycle_lock.lock().await;
        let state_description = self.state.describe_for_context().await;
        self.decider
            .decide(CycleRequest {
                origin,
                state_description,
                utterance,
            })
            .await
    }

    async fn autonomous_cycle(&self) -> Result<()> {
        let result = self.run_cycle(CycleOrigin::Autonomous, None).await;
        self.timer.reset();
        let output = result?;
        self.record(Speaker::Dog, CycleOrigin::Autonomous, autonomous_summary(&output));
        Ok(())
    }

    /// One pass of the autonomous trigger logic.
    pub async fn tick_once(&self) -> Result<TickDecision> {
        if self.state.is_busy().await {
            return Ok(TickDecision::Busy);
        }

        let elapsed = self.timer.elapsed();
        let quiet = elapsed >= self.autonomous_interval;

        if self.state.take_completion_flag().await {
            if !quiet {
                tracing::debug!(
                    "Behavior completed {:.1}s after last interaction, staying put",
                    elapsed.as_secs_f64()
                );
                return Ok(TickDecision::CompletionSuppressed);
            }
            tracing::info!("Behavior completed, deciding what to do next");
            self.autonomous_cycle().await?;
            return Ok(TickDecision::CompletionTriggered);
        }

        if quiet {
            tracing::info!(
                "{:.1}s since last interaction, acting autonomously",
                elapsed.as_secs_f64()
            );
            self.autonomous_cycle().await?;
            return Ok(TickDecision::Autonomous);
        }

        Ok(TickDecision::Idle)
    }

    /// Run an interactive cycle for an owner utterance and return the reply.
    pub async fn handle_user_input(&self, utterance: &str) -> Result<String> {
        let utterance = utterance.trim();
        self.record(Speaker::Owner, CycleOrigin::Interactive, utterance.to_string());
        self.timer.reset();

        let result = self
            .run_cycle(CycleOrigin::Interactive, Some(utterance.to_string()))
            .await;
        self.timer.reset();
        let output = result?;

        let reply = interactive_summary(&output);
        self.record(Speaker::Dog, CycleOrigin::Interactive, reply.clone());
        Ok(reply)
    }

    /// Spawn the tick loop. Runs until [`shutdown`](Self::shutdown).
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                "Orchestrator started (tick {:?}, autonomous after {:?})",
                self.tick_interval,
                self.autonomous_interval
            );
            while self.is_running() {
                tokio::time::sleep(self.tick_interval).await;
                if !self.is_running() {
                    break;
                }
                match self.tick_once().await {
                    Ok(decision) => tracing::debug!("Tick: {:?}", decision),
                    Err(e) => {
                        tracing::error!("Orchestrator tick failed: {:#}", e);
                        tokio::time::sleep(self.error_backoff).await;
                    }
                }
            }
            tracing::info!("Orchestrator stopped");
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("running", &self.is_running())
            .field("tick_interval", &self.tick_interval)
            .field("autonomous_interval", &self.autonomous_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueTiming;
    use canis_core::state::{BehaviorKind, PetState};
    use canis_core::{ManualClock, MemoryStore, NeedDynamics, NullAssets, TimeScale};

    /// Records every request and answers with a fixed output.
    struct ScriptedDecider {
        requests: Mutex<Vec<CycleRequest>>,
        output: CycleOutput,
        fail: bool,
    }

    impl ScriptedDecider {
        fn new(output: CycleOutput) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                output,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                output: CycleOutput::default(),
                fail: true,
            })
        }

        fn calls(&self) -> Vec<CycleRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl DecisionMaker for ScriptedDecider {
        async fn decide(&self, request: CycleRequest) -> Result<CycleOutput> {
            self.requests.lock().unwrap().push(request);
            if self.fail {
                anyhow::bail!("model unavailable");
            }
            Ok(self.output.clone())
        }
    }

    fn orchestrator(decider: Arc<ScriptedDecider>) -> (Arc<Orchestrator>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let state = Arc::new(StateManager::new(
            PetState::new(clock.now()),
            Arc::new(MemoryStore::new()),
            clock.clone(),
            NeedDynamics::default(),
            TimeScale::new(60.0).unwrap(),
        ));
        let timer = Arc::new(InteractionTimer::new(clock.clone()));
        let running = Arc::new(AtomicBool::new(true));
        let (queue, _worker) = ExecutionQueue::new(
            state.clone(),
            Arc::new(NullAssets),
            timer.clone(),
            running.clone(),
            QueueTiming::default(),
        );
        let timing = TimingConfig {
            tick_interval_secs: 0.02,
            ..TimingConfig::default()
        };
        let orch = Orchestrator::new(state, decider, timer, queue, running, &timing);
        (Arc::new(orch), clock)
    }

    #[tokio::test]
    async fn test_idle_until_quiet_then_autonomous() {
        let decider = ScriptedDecider::new(CycleOutput {
            text: String::new(),
            behaviors: vec!["stretch".into(), "yawn".into()],
        });
        let (orch, clock) = orchestrator(decider.clone());

        clock.advance_secs(10.0);
        assert_eq!(orch.tick_once().await.unwrap(), TickDecision::Idle);
        assert!(decider.calls().is_empty());

        clock.advance_secs(5.0);
        assert_eq!(orch.tick_once().await.unwrap(), TickDecision::Autonomous);
        let calls = decider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].origin, CycleOrigin::Autonomous);
        assert!(calls[0].utterance.is_none());
        assert!(calls[0].state_description.contains("overall feeling"));

        assert_eq!(orch.timer().elapsed(), Duration::ZERO);
        let transcript = orch.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].text, "performed: stretch, yawn");
    }

    #[tokio::test]
    async fn test_busy_skips_cycle() {
        let decider = ScriptedDecider::new(CycleOutput::default());
        let (orch, clock) = orchestrator(decider.clone());
        orch.state()
            .start_behavior(BehaviorKind::Sleeping, 120.0, "sleeping")
            .await
            .unwrap();
        clock.advance_secs(30.0);
        assert_eq!(orch.tick_once().await.unwrap(), TickDecision::Busy);
        assert!(decider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_completion_suppressed_after_recent_interaction() {
        let decider = ScriptedDecider::new(CycleOutput::default());
        let (orch, clock) = orchestrator(decider.clone());
        orch.state()
            .start_behavior(BehaviorKind::Drinking, 8.0, "drinking water")
            .await
            .unwrap();

        clock.advance_secs(9.0);
        assert_eq!(
            orch.tick_once().await.unwrap(),
            TickDecision::CompletionSuppressed
        );
        assert!(decider.calls().is_empty());
        // The flag was consumed by the suppressed tick
        assert!(!orch.state().take_completion_flag().await);
        assert_eq!(orch.tick_once().await.unwrap(), TickDecision::Idle);
    }

    #[tokio::test]
    async fn test_completion_triggers_when_quiet() {
        let decider = ScriptedDecider::new(CycleOutput::default());
        let (orch, clock) = orchestrator(decider.clone());
        orch.state()
            .start_behavior(BehaviorKind::Drinking, 8.0, "drinking water")
            .await
            .unwrap();

        clock.advance_secs(20.0);
        assert_eq!(
            orch.tick_once().await.unwrap(),
            TickDecision::CompletionTriggered
        );
        assert_eq!(decider.calls().len(), 1);
        assert_eq!(orch.transcript()[0].text, OBSERVING_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_user_input_records_and_resets() {
        let decider = ScriptedDecider::new(CycleOutput {
            text: "Woof!".into(),
            behaviors: vec!["sit".into()],
        });
        let (orch, clock) = orchestrator(decider.clone());
        clock.advance_secs(14.0);

        let reply = orch.handle_user_input("  sit!  ").await.unwrap();
        assert_eq!(reply, "🐾 sit\nWoof!");
        assert_eq!(orch.timer().elapsed(), Duration::ZERO);

        let calls = decider.calls();
        assert_eq!(calls[0].origin, CycleOrigin::Interactive);
        assert_eq!(calls[0].utterance.as_deref(), Some("sit!"));

        let transcript = orch.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].speaker, Speaker::Owner);
        assert_eq!(transcript[0].text, "sit!");
        assert_eq!(transcript[1].speaker, Speaker::Dog);
        assert_eq!(transcript[1].text, "🐾 sit\nWoof!");

        // The interaction pushed the autonomous trigger back
        clock.advance_secs(14.0);
        assert_eq!(orch.tick_once().await.unwrap(), TickDecision::Idle);
    }

    #[tokio::test]
    async fn test_empty_reply_uses_placeholder() {
        let decider = ScriptedDecider::new(CycleOutput::default());
        let (orch, _clock) = orchestrator(decider);
        let reply = orch.handle_user_input("hello").await.unwrap();
        assert_eq!(reply, PERFORMING_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_reply_lists_behaviors_without_text() {
        let decider = ScriptedDecider::new(CycleOutput {
            text: String::new(),
            behaviors: vec!["wag_tail".into(), "shake_paw".into()],
        });
        let (orch, _clock) = orchestrator(decider);
        let reply = orch.handle_user_input("good dog").await.unwrap();
        assert_eq!(reply, "🐾 wag_tail, shake_paw");
        assert_eq!(orch.transcript()[1].text, reply);
    }

    #[tokio::test]
    async fn test_failed_cycle_still_resets_timer() {
        let decider = ScriptedDecider::failing();
        let (orch, clock) = orchestrator(decider.clone());
        clock.advance_secs(20.0);
        assert!(orch.tick_once().await.is_err());
        assert_eq!(orch.timer().elapsed(), Duration::ZERO);
        assert_eq!(orch.tick_once().await.unwrap(), TickDecision::Idle);
        assert!(orch.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_loop_stops_on_shutdown() {
        let decider = ScriptedDecider::new(CycleOutput::default());
        let (orch, _clock) = orchestrator(decider);
        let handle = Arc::clone(&orch).spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;
        orch.shutdown();
        let result = tokio::time::timeout(Duration::from_millis(500), handle).await;
        assert!(result.is_ok(), "Orchestrator should stop after shutdown");
    }

    #[test]
    fn test_transcript_is_bounded() {
        let mut transcript = Transcript::with_capacity(2);
        for i in 0..3 {
            transcript.push(TranscriptEntry {
                speaker: Speaker::Dog,
                origin: CycleOrigin::Autonomous,
                text: i.to_string(),
                at: Utc::now(),
            });
        }
        let texts: Vec<_> = transcript.entries().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["1", "2"]);
    }
}
