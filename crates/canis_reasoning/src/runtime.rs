//! Assembles the running pet: queue worker, tools, agent and orchestrator.

use crate::agent_loop::Orchestrator;
use crate::engine::AgentEngine;
use crate::interaction::InteractionTimer;
use crate::llm::LlmClient;
use crate::queue::{ExecutionQueue, QueueTiming};
use crate::tool_registry::ToolRegistry;
use crate::tools::register_behavior_tools;
use canis_core::{AssetResolver, CanisConfig};
use canis_limbic::StateManager;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handles to the two background loops plus the shared orchestrator.
pub struct PetRuntime {
    pub orchestrator: Arc<Orchestrator>,
    pub engine: Arc<AgentEngine>,
    worker: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

impl PetRuntime {
    /// Wire everything together and start both loops.
    pub fn start(
        state: Arc<StateManager>,
        client: Arc<dyn LlmClient>,
        assets: Arc<dyn AssetResolver>,
        config: &CanisConfig,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let timer = Arc::new(InteractionTimer::new(state.clock()));
        let timing = QueueTiming {
            idle_wait: config.timing.queue_idle(),
            completion_poll: config.timing.completion_poll(),
            error_backoff: config.timing.error_backoff(),
        };
        let (queue, worker) = ExecutionQueue::new(
            Arc::clone(&state),
            assets,
            Arc::clone(&timer),
            Arc::clone(&running),
            timing,
        );

        let mut registry = ToolRegistry::new();
        register_behavior_tools(&mut registry, Arc::clone(&state), queue.clone());
        let engine = Arc::new(AgentEngine::new(client, Arc::new(registry), &config.llm));

        let orchestrator = Arc::new(Orchestrator::new(
            state,
            engine.clone(),
            timer,
            queue,
            running,
            &config.timing,
        ));

        let worker = worker.spawn();
        let ticker = Arc::clone(&orchestrator).spawn();
        tracing::info!("Pet runtime started");

        Self {
            orchestrator,
            engine,
            worker,
            ticker,
        }
    }

    /// Stop both loops, wait for them, then save the final state.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.orchestrator.shutdown();
        if let Err(e) = self.ticker.await {
            tracing::warn!("Orchestrator task ended abnormally: {}", e);
        }
        if let Err(e) = self.worker.await {
            tracing::warn!("Queue worker ended abnormally: {}", e);
        }
        self.orchestrator.state().save().await?;
        tracing::info!("Pet runtime stopped, state saved");
        Ok(())
    }
}
