//! Mock LLM Provider: deterministic responses for running without API keys.
//!
//! Reads the rendered state in the last user message and answers with tool
//! calls that address the most pressing needs. Once tool results come back it
//! replies with a short bark.

use crate::api_types::{ContentBlock, Message, MessagesResponse, Role, Tool};
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts::OWNER_MARKER;
use anyhow::Result;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }

    /// Behaviors (name, seconds) chosen for a prompt.
    pub fn plan(prompt: &str) -> Vec<(&'static str, u32)> {
        let mut plan = Vec::new();

        if prompt.contains("the dog is busy") {
            plan.push(("wag_tail", 3));
            return plan;
        }
        if prompt.contains(OWNER_MARKER) {
            plan.push(("look_up_at_owner", 3));
            plan.push(("wag_tail", 5));
        }
        if prompt.contains("very hungry") {
            plan.push(("eat_food", 900));
        }
        if prompt.contains("very thirsty") {
            plan.push(("drink_water", 600));
        }
        if prompt.contains("exhausted") {
            plan.push(("sleep", 10800));
        }
        if prompt.contains("very bored") || prompt.contains("a bit bored") {
            plan.push(("sniff_ground", 15));
        }
        if plan.is_empty() {
            plan.push(("stretch", 5));
        }
        plan
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(
        &self,
        _system: &str,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        _params: CompletionParams,
    ) -> Result<MessagesResponse> {
        let Some(last) = messages.last() else {
            return Ok(MessagesResponse::text(format!("(Mock {}) Woof?", self.model)));
        };

        let answered = last
            .content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolResult { .. }));
        if answered || last.role != Role::User {
            return Ok(MessagesResponse::text("Woof! 🐾"));
        }

        let prompt = last.text();
        let content: Vec<ContentBlock> = Self::plan(&prompt)
            .into_iter()
            .filter(|(name, _)| tools.iter().any(|t| t.name == *name))
            .enumerate()
            .map(|(i, (name, secs))| ContentBlock::ToolUse {
                id: format!("mock_call_{}", i),
                name: name.to_string(),
                input: json!({ "duration_seconds": secs }),
            })
            .collect();

        if content.is_empty() {
            return Ok(MessagesResponse::text(format!("(Mock {}) Woof.", self.model)));
        }
        Ok(MessagesResponse {
            content,
            stop_reason: Some("tool_calls".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::ToolInputSchema;

    fn tool(name: &str) -> Tool {
        Tool {
            name: name.to_string(),
            description: String::new(),
            input_schema: ToolInputSchema::empty(),
        }
    }

    #[test]
    fn test_plan_addresses_needs() {
        let plan = MockProvider::plan("overall feeling: very hungry, exhausted");
        assert_eq!(plan, vec![("eat_food", 900), ("sleep", 10800)]);
        assert_eq!(MockProvider::plan("overall feeling: content"), vec![("stretch", 5)]);
    }

    #[tokio::test]
    async fn test_mock_complete_emits_tool_calls() {
        let provider = MockProvider::new("test-model");
        let resp = provider
            .complete(
                "system",
                vec![Message::user_text("overall feeling: very thirsty")],
                vec![tool("drink_water"), tool("stretch")],
                CompletionParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(resp.content.len(), 1);
        match &resp.content[0] {
            ContentBlock::ToolUse { name, input, .. } => {
                assert_eq!(name, "drink_water");
                assert_eq!(input["duration_seconds"], 600);
            }
            other => panic!("Expected ToolUse block, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_replies_after_tool_results() {
        let provider = MockProvider::new("test-model");
        let results = Message {
            role: Role::User,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: "mock_call_0".into(),
                content: "✓ stretching".into(),
                is_error: None,
            }],
        };
        let resp = provider
            .complete("system", vec![results], vec![tool("stretch")], CompletionParams::default())
            .await
            .unwrap();
        assert!(matches!(&resp.content[0], ContentBlock::Text { text } if text.contains("Woof")));
    }
}
