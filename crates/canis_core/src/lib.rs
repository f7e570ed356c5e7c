pub mod catalog;
pub mod clock;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod state;
pub mod store;
pub mod tools;

pub use catalog::{BehaviorEffect, BehaviorSpec, Category, CATALOG};
pub use clock::{Clock, ManualClock, SystemClock, TimeScale};
pub use config::CanisConfig;
pub use dynamics::NeedDynamics;
pub use error::{PetError, PetResult};
pub use state::{
    ActiveBehavior, Attribute, AttributeDelta, BehaviorKind, BehaviorProgress, PetState,
};
pub use store::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::PathBuf;

/// Which kind of cycle produced a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOrigin {
    /// Triggered by the orchestrator tick.
    Autonomous,
    /// Triggered by an owner utterance.
    Interactive,
}

impl CycleOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOrigin::Autonomous => "autonomous",
            CycleOrigin::Interactive => "interactive",
        }
    }
}

/// Input of one decision cycle.
#[derive(Debug, Clone)]
pub struct CycleRequest {
    pub origin: CycleOrigin,
    /// Rendered state snapshot, refreshed just before the cycle.
    pub state_description: String,
    /// What the owner said, for interactive cycles.
    pub utterance: Option<String>,
}

/// Result of one decision cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleOutput {
    pub text: String,
    /// Behavior names the agent invoked, in call order.
    pub behaviors: Vec<String>,
}

/// Durable storage of the singleton pet state.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load_state(&self) -> anyhow::Result<Option<PetState>>;
    async fn save_state(&self, state: &PetState) -> anyhow::Result<()>;
}

/// Notified whenever a behavior is about to run.
pub trait AssetResolver: Send + Sync + Debug {
    /// Returns the asset chosen for `name`. Callers ignore the value.
    fn on_behavior_name_resolved(&self, name: &str) -> anyhow::Result<PathBuf>;

    /// The asset most recently chosen, if the resolver tracks one.
    fn current(&self) -> Option<PathBuf> {
        None
    }
}

/// Resolver that picks nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAssets;

impl AssetResolver for NullAssets {
    fn on_behavior_name_resolved(&self, name: &str) -> anyhow::Result<PathBuf> {
        Ok(PathBuf::from(name))
    }
}

/// Chooses what the dog does in a cycle.
#[async_trait]
pub trait DecisionMaker: Send + Sync {
    async fn decide(&self, request: CycleRequest) -> anyhow::Result<CycleOutput>;
}
