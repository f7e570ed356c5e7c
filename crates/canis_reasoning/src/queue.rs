//! Sequential execution of agent-requested behaviors.
//!
//! Producers push [`BehaviorTask`]s through an unbounded channel and never
//! block. A single [`QueueWorker`] drains it in order: it notifies the asset
//! resolver, runs the task's action, and for long-term behaviors waits until
//! the behavior slot is idle again before taking the next task.

use crate::interaction::InteractionTimer;
use canis_core::{AssetResolver, CycleOrigin};
use canis_limbic::StateManager;
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Instant,
    LongTerm,
}

/// What running an action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Instant behavior applied.
    Done(String),
    /// Long-term behavior now occupies the slot.
    Started(String),
    /// Long-term behavior could not start (slot busy).
    Rejected(String),
}

pub type TaskAction = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<ActionOutcome>> + Send>;

pub struct BehaviorTask {
    pub kind: TaskKind,
    pub description: String,
    /// Virtual minutes; instant tasks carry `seconds / 60`.
    pub estimated_minutes: f64,
    /// Key handed to the asset resolver.
    pub behavior_name: String,
    pub origin: CycleOrigin,
    pub action: TaskAction,
}

impl std::fmt::Debug for BehaviorTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorTask")
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("estimated_minutes", &self.estimated_minutes)
            .field("behavior_name", &self.behavior_name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Worker timing knobs.
#[derive(Debug, Clone)]
pub struct QueueTiming {
    pub idle_wait: Duration,
    pub completion_poll: Duration,
    pub error_backoff: Duration,
}

impl Default for QueueTiming {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_millis(500),
            completion_poll: Duration::from_secs(1),
            error_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    executing: Mutex<Option<String>>,
    pending: AtomicUsize,
}

/// Producer side. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ExecutionQueue {
    tx: mpsc::UnboundedSender<BehaviorTask>,
    shared: Arc<Shared>,
}

impl ExecutionQueue {
    /// Create the queue and its (not yet started) worker.
    pub fn new(
        state: Arc<StateManager>,
        assets: Arc<dyn AssetResolver>,
        timer: Arc<InteractionTimer>,
        running: Arc<AtomicBool>,
        timing: QueueTiming,
    ) -> (Self, QueueWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        let worker = QueueWorker {
            rx,
            shared: Arc::clone(&shared),
            state,
            assets,
            timer,
            running,
            timing,
        };
        (Self { tx, shared }, worker)
    }

    /// Append a task. Never blocks.
    pub fn enqueue(&self, task: BehaviorTask) -> anyhow::Result<()> {
        tracing::debug!(
            "Queued {} ({:.1} min, {})",
            task.description,
            task.estimated_minutes,
            task.origin.as_str()
        );
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        self.tx.send(task).map_err(|e| {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            anyhow::anyhow!("Execution queue is closed, dropped {}", e.0.description)
        })
    }

    /// Description of the task currently executing.
    pub fn executing(&self) -> Option<String> {
        self.shared
            .executing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Tasks waiting behind the executing one.
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }
}

/// Single consumer of the queue.
pub struct QueueWorker {
    rx: mpsc::UnboundedReceiver<BehaviorTask>,
    shared: Arc<Shared>,
    state: Arc<StateManager>,
    assets: Arc<dyn AssetResolver>,
    timer: Arc<InteractionTimer>,
    running: Arc<AtomicBool>,
    timing: QueueTiming,
}

impl QueueWorker {
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain tasks until the running flag clears or every producer is gone.
    pub async fn run(mut self) {
        tracing::info!("Behavior queue executor started");
        while self.running.load(Ordering::SeqCst) {
            let task = match tokio::time::timeout(self.timing.idle_wait, self.rx.recv()).await {
                Ok(Some(task)) => task,
                Ok(None) => {
                    tracing::info!("Execution queue closed, executor exiting");
                    break;
                }
                Err(_) => continue,
            };
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            self.execute(task).await;
        }
        tracing::info!("Behavior queue executor stopped");
    }

    fn set_executing(&self, value: Option<String>) {
        *self
            .shared
            .executing
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = value;
    }

    async fn execute(&self, task: BehaviorTask) {
        let BehaviorTask {
            kind,
            description,
            behavior_name,
            origin,
            action,
            ..
        } = task;

        tracing::info!("Executing {}", description);
        self.set_executing(Some(description.clone()));

        if let Err(e) = self.assets.on_behavior_name_resolved(&behavior_name) {
            tracing::warn!("Asset lookup for {} failed: {:#}", behavior_name, e);
        }

        // Spawned so that a panicking action only fails its own task
        match tokio::spawn(action()).await {
            Ok(Ok(ActionOutcome::Started(message))) => {
                tracing::debug!("{} -> {}", description, message);
                if kind == TaskKind::LongTerm {
                    self.await_completion(&description).await;
                }
            }
            Ok(Ok(ActionOutcome::Rejected(message))) => {
                tracing::info!("{} could not start: {}", description, message);
            }
            Ok(Ok(ActionOutcome::Done(message))) => {
                tracing::debug!("{} -> {}", description, message);
            }
            Ok(Err(e)) => {
                let err = canis_core::PetError::ActionExecution(format!("{description}: {e:#}"));
                tracing::error!("{}", err);
            }
            Err(join_err) => {
                let err =
                    canis_core::PetError::ActionExecution(format!("{description}: {join_err}"));
                tracing::error!("{}", err);
                tokio::time::sleep(self.timing.error_backoff).await;
            }
        }

        if origin == CycleOrigin::Interactive {
            self.timer.reset();
            tracing::debug!("Interactive task finished, interaction timer reset");
        }
        self.set_executing(None);
    }

    async fn await_completion(&self, description: &str) {
        tracing::info!("Waiting for {} to complete", description);
        while self.running.load(Ordering::SeqCst) && self.state.is_busy().await {
            tokio::time::sleep(self.timing.completion_poll).await;
        }
        tracing::info!("{} no longer occupies the slot", description);
    }
}
