//! The state manager: single owner of the dog's state.
//!
//! Every read or write goes through one async mutex. Each access first
//! integrates the time elapsed since the last update (need decay, then the
//! behavior slot), so readers never observe a behavior that should already
//! have finished. Each mutation is persisted while the lock is still held,
//! which keeps saves in mutation order.

use crate::slot::{self, SlotTick};
use anyhow::Context;
use canis_core::state::{AttributeDelta, BehaviorKind, BehaviorProgress, PetState};
use canis_core::{Clock, NeedDynamics, PetResult, StateStore, TimeScale};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

struct Inner {
    state: PetState,
    scale: TimeScale,
}

pub struct StateManager {
    inner: Mutex<Inner>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    dynamics: NeedDynamics,

    /// Broadcasts the latest state after every refresh (presentation polls this).
    state_watch_tx: watch::Sender<PetState>,
    state_watch_rx: watch::Receiver<PetState>,
}

impl StateManager {
    pub fn new(
        state: PetState,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        dynamics: NeedDynamics,
        scale: TimeScale,
    ) -> Self {
        let (state_watch_tx, state_watch_rx) = watch::channel(state.clone());
        Self {
            inner: Mutex::new(Inner { state, scale }),
            store,
            clock,
            dynamics,
            state_watch_tx,
            state_watch_rx,
        }
    }

    /// Restore the persisted state, or start a fresh dog if none exists.
    ///
    /// Load failures propagate: starting over silently would lose the dog.
    pub async fn load(
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        dynamics: NeedDynamics,
        scale: TimeScale,
    ) -> anyhow::Result<Self> {
        let loaded = store
            .load_state()
            .await
            .context("Failed to load persisted pet state")?;

        let state = match loaded {
            Some(mut state) => {
                state.normalize();
                tracing::info!(
                    "Restored pet state (activity: {})",
                    state
                        .activity
                        .as_ref()
                        .map(|a| a.description.as_str())
                        .unwrap_or("none")
                );
                state
            }
            None => {
                tracing::info!("No saved pet state, starting fresh");
                PetState::new(clock.now())
            }
        };

        Ok(Self::new(state, store, clock, dynamics, scale))
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Subscribe to state updates.
    pub fn subscribe(&self) -> watch::Receiver<PetState> {
        self.state_watch_rx.clone()
    }

    // =========================================================================
    // Internal helpers (caller holds the lock)
    // =========================================================================

    /// Integrate elapsed time: decay first, then advance the slot.
    fn advance(&self, inner: &mut Inner) -> SlotTick {
        let now = self.clock.now();
        let state = &mut inner.state;

        let minutes = inner.scale.minutes_between(state.last_update, now);
        let sleeping = state.current_kind() == Some(BehaviorKind::Sleeping);
        self.dynamics.apply_decay(state, minutes, sleeping);
        if now > state.last_update {
            state.last_update = now;
        }

        slot::tick(state, now, inner.scale)
    }

    /// Persist and publish. Save failures are logged and swallowed.
    async fn persist(&self, inner: &Inner) {
        if let Err(e) = self.store.save_state(&inner.state).await {
            tracing::warn!("Failed to save pet state: {:#}", e);
        }
        self.state_watch_tx.send_replace(inner.state.clone());
    }

    async fn refreshed(&self) -> tokio::sync::MutexGuard<'_, Inner> {
        let mut inner = self.inner.lock().await;
        let tick = self.advance(&mut inner);
        if let SlotTick::Completed(kind) = tick {
            tracing::debug!("Slot completed {} during refresh", kind);
        }
        self.persist(&inner).await;
        inner
    }

    // =========================================================================
    // Public operations
    // =========================================================================

    /// Bring the state up to date and return a copy.
    pub async fn refresh(&self) -> PetState {
        self.refreshed().await.state.clone()
    }

    /// Alias of [`refresh`](Self::refresh) for readers.
    pub async fn snapshot(&self) -> PetState {
        self.refresh().await
    }

    /// Occupy the behavior slot.
    pub async fn start_behavior(
        &self,
        kind: BehaviorKind,
        duration_minutes: f64,
        description: &str,
    ) -> PetResult<()> {
        let mut inner = self.refreshed().await;
        let now = self.clock.now();
        slot::start(&mut inner.state, kind, duration_minutes, description, now)?;
        tracing::info!(
            "Started {} for {:.1} virtual minutes",
            description,
            duration_minutes
        );
        self.persist(&inner).await;
        Ok(())
    }

    /// Stop the running behavior early.
    pub async fn interrupt_behavior(&self, reason: &str) -> PetResult<String> {
        let mut inner = self.refreshed().await;
        let message = slot::interrupt(&mut inner.state, reason)?;
        self.persist(&inner).await;
        Ok(message)
    }

    /// True while a behavior occupies the slot and has time left.
    pub async fn is_busy(&self) -> bool {
        let inner = self.refreshed().await;
        slot::is_busy(&inner.state, self.clock.now(), inner.scale)
    }

    pub async fn behavior_progress(&self) -> Option<BehaviorProgress> {
        let inner = self.refreshed().await;
        slot::progress(&inner.state, self.clock.now(), inner.scale)
    }

    /// Read and clear the completion flag.
    pub async fn take_completion_flag(&self) -> bool {
        let mut inner = self.refreshed().await;
        let flag = std::mem::take(&mut inner.state.just_completed);
        if flag {
            self.persist(&inner).await;
        }
        flag
    }

    /// Apply instant deltas.
    pub async fn apply_deltas(&self, deltas: &[AttributeDelta]) -> PetState {
        let mut inner = self.refreshed().await;
        self.dynamics.apply_delta(&mut inner.state, deltas);
        self.persist(&inner).await;
        inner.state.clone()
    }

    /// Arbitrary mutation under the lock; the state is normalized afterwards.
    pub async fn modify<F>(&self, f: F) -> PetState
    where
        F: FnOnce(&mut PetState),
    {
        let mut inner = self.refreshed().await;
        f(&mut inner.state);
        inner.state.normalize();
        self.persist(&inner).await;
        inner.state.clone()
    }

    /// State description for the agent prompt.
    pub async fn describe_for_context(&self) -> String {
        let inner = self.refreshed().await;
        let now = self.clock.now();
        let progress = slot::is_busy(&inner.state, now, inner.scale)
            .then(|| slot::progress(&inner.state, now, inner.scale))
            .flatten();
        inner.state.describe_for_context(progress.as_ref())
    }

    pub async fn status_text(&self) -> String {
        self.refreshed().await.state.status_text()
    }

    pub async fn time_scale(&self) -> TimeScale {
        self.inner.lock().await.scale
    }

    /// Change the time scale. Elapsed decay is integrated at the old scale
    /// first; the running behavior's progress is re-read at the new one.
    pub async fn set_time_scale(&self, factor: f64) -> PetResult<TimeScale> {
        let scale = TimeScale::new(factor)?;
        let mut inner = self.refreshed().await;
        let old = std::mem::replace(&mut inner.scale, scale);
        tracing::info!("Time scale changed {} -> {}", old.factor(), scale.factor());
        Ok(scale)
    }

    /// Save explicitly, propagating failures (shutdown path).
    pub async fn save(&self) -> anyhow::Result<()> {
        let inner = self.inner.lock().await;
        self.store
            .save_state(&inner.state)
            .await
            .context("Failed to save pet state")
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("clock", &self.clock)
            .field("dynamics", &self.dynamics)
            .finish_non_exhaustive()
    }
}
