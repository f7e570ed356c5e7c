//! Tool abstraction types shared between the agent engine and the behavior
//! tools.

use crate::CycleOrigin;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON tool definition sent to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// JSON Schema for tool input parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: Value,
    pub required: Vec<String>,
}

impl ToolInputSchema {
    /// Object schema with no parameters.
    pub fn empty() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: serde_json::json!({}),
            required: vec![],
        }
    }
}

/// Classification of tool execution errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolErrorKind {
    /// Transient: the dog is busy, try again later.
    Transient,
    /// Permanent: bad parameter, unknown tool.
    Permanent,
}

/// Structured result from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
    pub error_kind: Option<ToolErrorKind>,
}

impl ToolOutcome {
    pub fn ok(content: String) -> Self {
        Self { content, is_error: false, error_kind: None }
    }

    pub fn transient_error(msg: String) -> Self {
        Self { content: msg, is_error: true, error_kind: Some(ToolErrorKind::Transient) }
    }

    pub fn permanent_error(msg: String) -> Self {
        Self { content: msg, is_error: true, error_kind: Some(ToolErrorKind::Permanent) }
    }
}

/// Per-call context handed to every tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolContext {
    /// Which kind of cycle issued the call.
    pub origin: CycleOrigin,
}

impl ToolContext {
    pub fn new(origin: CycleOrigin) -> Self {
        Self { origin }
    }
}

/// Trait for tool handlers that can be registered and dispatched.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Unique name used for dispatch (must match the tool name in schema).
    fn name(&self) -> &str;
    /// Human-readable description for logging.
    fn description(&self) -> &str;
    /// JSON schema sent to the LLM so it knows how to call this tool.
    fn schema(&self) -> Tool;
    /// Execute the tool with the given JSON input.
    async fn execute(&self, input: &Value, ctx: &ToolContext) -> ToolOutcome;
}
