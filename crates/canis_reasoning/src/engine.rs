//! The agent: one tool-use loop per decision cycle.

use crate::api_types::{ContentBlock, Message, Role};
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts;
use crate::tool_registry::ToolRegistry;
use anyhow::Result;
use canis_core::config::LlmConfig;
use canis_core::tools::{ToolContext, ToolErrorKind, ToolOutcome};
use canis_core::{CycleOrigin, CycleOutput, CycleRequest, DecisionMaker};
use std::sync::Arc;
use std::time::Duration;

/// Maximum number of retries for transient tool failures.
const TOOL_MAX_RETRIES: usize = 1;

/// Consecutive rounds with a permanent tool failure before the loop gives up.
const MAX_PERMANENT_FAIL_ROUNDS: u32 = 2;

pub struct AgentEngine {
    client: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    params: CompletionParams,
    max_tool_rounds: usize,
    history_limit: usize,
    history: tokio::sync::Mutex<Vec<Message>>,
}

impl AgentEngine {
    pub fn new(client: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>, cfg: &LlmConfig) -> Self {
        Self {
            client,
            registry,
            params: CompletionParams {
                max_tokens: cfg.max_tokens,
                temperature: cfg.temperature.clamp(0.0, 2.0),
            },
            max_tool_rounds: cfg.max_tool_rounds.max(1),
            history_limit: cfg.history_messages,
            history: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Conversation kept across cycles (user prompts and final replies).
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }

    /// Execute a tool with automatic retry for transient failures.
    #[tracing::instrument(skip(self, input, ctx), fields(tool = name))]
    async fn execute_tool_with_retry(
        &self,
        name: &str,
        input: &serde_json::Value,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        let mut outcome = self.registry.dispatch(name, input, ctx).await;

        let mut attempt = 0;
        while outcome.is_error
            && outcome.error_kind == Some(ToolErrorKind::Transient)
            && attempt < TOOL_MAX_RETRIES
        {
            attempt += 1;
            tracing::info!(
                "Retrying tool '{}' (attempt {}/{})",
                name,
                attempt,
                TOOL_MAX_RETRIES
            );
            tokio::time::sleep(Duration::from_millis(500)).await;
            outcome = self.registry.dispatch(name, input, ctx).await;
        }
        outcome
    }

    async fn record_exchange(&self, prompt: &str, reply: &str) {
        let mut history = self.history.lock().await;
        history.push(Message::user_text(prompt));
        if !reply.is_empty() {
            history.push(Message::assistant_text(reply));
        }
        prune_history(&mut history, self.history_limit);
    }
}

/// Drop the oldest messages beyond `limit`, then any leading assistant turns
/// so the replay always starts with the user.
pub fn prune_history(history: &mut Vec<Message>, limit: usize) {
    if history.len() > limit {
        let overflow = history.len() - limit;
        history.drain(0..overflow);
    }
    let leading = history
        .iter()
        .take_while(|m| m.role == Role::Assistant)
        .count();
    history.drain(0..leading);
}

#[async_trait::async_trait]
impl DecisionMaker for AgentEngine {
    async fn decide(&self, request: CycleRequest) -> Result<CycleOutput> {
        let system = prompts::system_prompt(request.origin);
        let prompt = match (request.origin, request.utterance.as_deref()) {
            (CycleOrigin::Interactive, Some(utterance)) => {
                prompts::interactive_prompt(&request.state_description, utterance)
            }
            _ => prompts::autonomous_prompt(&request.state_description),
        };
        tracing::debug!("[{}] prompt: {}", request.origin.as_str(), prompt);

        let ctx = ToolContext::new(request.origin);
        let tools = self.registry.available_tools();
        let mut scratchpad = self.history.lock().await.clone();
        scratchpad.push(Message::user_text(prompt.clone()));

        let mut output = CycleOutput::default();
        let mut consecutive_permanent_fails = 0u32;

        for round in 0..self.max_tool_rounds {
            let response = self
                .client
                .complete(&system, scratchpad.clone(), tools.clone(), self.params.clone())
                .await?;

            output.text.clear();
            let mut tool_uses = Vec::new();
            for block in &response.content {
                match block {
                    ContentBlock::Text { text } => {
                        tracing::debug!("LLM Text: {}", text);
                        output.text.push_str(text);
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        tool_uses.push((id.clone(), name.clone(), input.clone()));
                    }
                    ContentBlock::ToolResult { .. } => {}
                }
            }
            scratchpad.push(Message {
                role: Role::Assistant,
                content: response.content,
            });

            if tool_uses.is_empty() {
                break;
            }

            tracing::info!("Round {}: {} tool call(s)", round + 1, tool_uses.len());
            let mut result_blocks = Vec::with_capacity(tool_uses.len());
            let mut any_permanent_fail = false;

            for (id, name, input) in &tool_uses {
                tracing::info!("Tool: {} input: {}", name, input);
                let outcome = self.execute_tool_with_retry(name, input, &ctx).await;
                if outcome.is_error {
                    tracing::warn!("Tool '{}' failed: {}", name, outcome.content);
                    if outcome.error_kind == Some(ToolErrorKind::Permanent) {
                        any_permanent_fail = true;
                    }
                } else {
                    output.behaviors.push(name.clone());
                }
                result_blocks.push(ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content: outcome.content,
                    is_error: outcome.is_error.then_some(true),
                });
            }
            scratchpad.push(Message {
                role: Role::User,
                content: result_blocks,
            });

            if any_permanent_fail {
                consecutive_permanent_fails += 1;
            } else {
                consecutive_permanent_fails = 0;
            }
            if consecutive_permanent_fails >= MAX_PERMANENT_FAIL_ROUNDS {
                tracing::warn!("Tool calls failing repeatedly, ending cycle");
                break;
            }

            // Text emitted alongside tool calls is not the final reply
            output.text.clear();
        }

        output.text = output.text.trim().to_string();
        self.record_exchange(&prompt, &output.text).await;
        tracing::info!(
            "[{}] cycle done: behaviors={:?}",
            request.origin.as_str(),
            output.behaviors
        );
        Ok(output)
    }
}
