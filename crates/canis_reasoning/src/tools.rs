//! Catalog behaviors exposed as agent tools.
//!
//! Every catalog entry becomes one tool. Calling a behavior tool never
//! executes anything directly: it wraps the behavior in a [`BehaviorTask`],
//! enqueues it and acknowledges immediately. The interrupt tool is the
//! exception and acts on the slot at once, so the owner can wake the dog
//! while the queue is blocked behind a long behavior.

use crate::api_types::{Tool, ToolInputSchema};
use crate::queue::{ActionOutcome, BehaviorTask, ExecutionQueue, TaskKind};
use crate::tool_registry::ToolRegistry;
use canis_core::catalog::{BehaviorEffect, BehaviorSpec, CATALOG};
use canis_core::tools::{ToolContext, ToolHandler, ToolOutcome};
use canis_core::PetError;
use canis_limbic::StateManager;
use futures_util::FutureExt;
use serde_json::{json, Value};
use std::sync::Arc;

/// Reason recorded when the agent wakes the dog.
pub const INTERRUPT_REASON: &str = "woken by owner";

/// Register one tool per catalog entry.
pub fn register_behavior_tools(
    registry: &mut ToolRegistry,
    state: Arc<StateManager>,
    queue: ExecutionQueue,
) {
    for spec in CATALOG {
        match spec.effect {
            BehaviorEffect::Interrupt => registry.register(Box::new(InterruptTool {
                spec,
                state: Arc::clone(&state),
            })),
            _ => registry.register(Box::new(BehaviorTool {
                spec,
                state: Arc::clone(&state),
                queue: queue.clone(),
            })),
        }
    }
    tracing::info!("Registered {} behavior tools", CATALOG.len());
}

/// Read `duration_seconds`, falling back to the catalog default.
///
/// Non-positive values are raised to one second; anything that is not a
/// number is rejected.
pub fn duration_seconds(input: &Value, default_secs: u32) -> Result<f64, String> {
    let raw = match input.get("duration_seconds") {
        None | Some(Value::Null) => return Ok(f64::from(default_secs).max(1.0)),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match raw {
        Some(secs) if secs.is_finite() => Ok(secs.max(1.0)),
        _ => Err(format!(
            "duration_seconds must be a number of seconds, got {}",
            input["duration_seconds"]
        )),
    }
}

// ============================================================================
// Queued behaviors
// ============================================================================

pub struct BehaviorTool {
    spec: &'static BehaviorSpec,
    state: Arc<StateManager>,
    queue: ExecutionQueue,
}

impl BehaviorTool {
    fn task(&self, secs: f64, ctx: &ToolContext) -> BehaviorTask {
        let spec = self.spec;
        let state = Arc::clone(&self.state);
        let minutes = secs / 60.0;

        match spec.effect {
            BehaviorEffect::LongTerm(kind) => BehaviorTask {
                kind: TaskKind::LongTerm,
                description: spec.label.to_string(),
                estimated_minutes: minutes,
                behavior_name: spec.name.to_string(),
                origin: ctx.origin,
                action: Box::new(move || {
                    async move {
                        tracing::info!("🐕 {}", spec.flavor);
                        match state.start_behavior(kind, minutes, spec.label).await {
                            Ok(()) => Ok(ActionOutcome::Started(format!(
                                "{} for {:.1} minutes",
                                spec.label, minutes
                            ))),
                            Err(e @ PetError::Busy { .. }) => {
                                Ok(ActionOutcome::Rejected(e.to_string()))
                            }
                            Err(e) => Err(e.into()),
                        }
                    }
                    .boxed()
                }),
            },
            _ => BehaviorTask {
                kind: TaskKind::Instant,
                description: spec.label.to_string(),
                estimated_minutes: minutes,
                behavior_name: spec.name.to_string(),
                origin: ctx.origin,
                action: Box::new(move || {
                    async move {
                        tracing::info!("🐕 {}", spec.flavor);
                        state.apply_deltas(spec.deltas()).await;
                        Ok(ActionOutcome::Done(spec.label.to_string()))
                    }
                    .boxed()
                }),
            },
        }
    }
}

#[async_trait::async_trait]
impl ToolHandler for BehaviorTool {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn description(&self) -> &str {
        self.spec.summary
    }

    fn schema(&self) -> Tool {
        let (lo, hi) = self.spec.range_secs;
        Tool {
            name: self.spec.name.to_string(),
            description: self.spec.summary.to_string(),
            input_schema: ToolInputSchema {
                schema_type: "object".to_string(),
                properties: json!({
                    "duration_seconds": {
                        "type": "integer",
                        "description": format!(
                            "How long to keep it up, in seconds (suggested {}-{}, default {})",
                            lo, hi, self.spec.default_secs
                        )
                    }
                }),
                required: vec![],
            },
        }
    }

    async fn execute(&self, input: &Value, ctx: &ToolContext) -> ToolOutcome {
        let secs = match duration_seconds(input, self.spec.default_secs) {
            Ok(secs) => secs,
            Err(msg) => return ToolOutcome::permanent_error(msg),
        };

        let ahead = self.queue.executing();
        if let Err(e) = self.queue.enqueue(self.task(secs, ctx)) {
            return ToolOutcome::permanent_error(format!("{:#}", e));
        }

        match ahead {
            Some(current) => ToolOutcome::ok(format!(
                "✓ {} (queued after {})",
                self.spec.label, current
            )),
            None => ToolOutcome::ok(format!("✓ {}", self.spec.label)),
        }
    }
}

// ============================================================================
// Interrupt
// ============================================================================

pub struct InterruptTool {
    spec: &'static BehaviorSpec,
    state: Arc<StateManager>,
}

#[async_trait::async_trait]
impl ToolHandler for InterruptTool {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn description(&self) -> &str {
        self.spec.summary
    }

    fn schema(&self) -> Tool {
        Tool {
            name: self.spec.name.to_string(),
            description: self.spec.summary.to_string(),
            input_schema: ToolInputSchema::empty(),
        }
    }

    async fn execute(&self, _input: &Value, ctx: &ToolContext) -> ToolOutcome {
        match self.state.interrupt_behavior(INTERRUPT_REASON).await {
            Ok(message) => {
                tracing::info!("{} ({} cycle)", message, ctx.origin.as_str());
                ToolOutcome::ok(format!("✓ {}", message))
            }
            Err(PetError::NothingToInterrupt) => {
                ToolOutcome::ok(PetError::NothingToInterrupt.to_string())
            }
            Err(e) => ToolOutcome::permanent_error(e.to_string()),
        }
    }
}
