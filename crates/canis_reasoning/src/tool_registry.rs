use crate::api_types::Tool;
use canis_core::tools::{ToolContext, ToolHandler, ToolOutcome};
use std::collections::HashMap;

// ============================================================================
// ToolRegistry
// ============================================================================

/// Named tool handlers, listed to the LLM in registration order.
pub struct ToolRegistry {
    handlers: HashMap<String, Box<dyn ToolHandler>>,
    order: Vec<String>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool handler. Overwrites any existing handler with the same name.
    pub fn register(&mut self, handler: Box<dyn ToolHandler>) {
        let name = handler.name().to_string();
        tracing::debug!("Registered tool: {}", name);
        if self.handlers.insert(name.clone(), handler).is_none() {
            self.order.push(name);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Get the list of Tool schemas for the LLM.
    pub fn available_tools(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|h| h.schema())
            .collect()
    }

    /// Dispatch a tool call by name.
    pub async fn dispatch(
        &self,
        name: &str,
        input: &serde_json::Value,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        match self.handlers.get(name) {
            Some(handler) => handler.execute(input, ctx).await,
            None => ToolOutcome::permanent_error(format!("Unknown tool: {}", name)),
        }
    }
}
