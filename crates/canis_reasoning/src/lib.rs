pub mod agent_loop;
pub mod api_types;
pub mod engine;
pub mod interaction;
pub mod llm;
pub mod prompts;
pub mod providers;
pub mod queue;
pub mod retry;
pub mod runtime;
pub mod tool_registry;
pub mod tools;

pub use agent_loop::{Orchestrator, TickDecision, TranscriptEntry};
pub use engine::AgentEngine;
pub use interaction::InteractionTimer;
pub use queue::{ExecutionQueue, QueueWorker};
pub use runtime::PetRuntime;
