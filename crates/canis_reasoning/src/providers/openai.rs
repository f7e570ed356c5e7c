//! OpenAI-compatible chat completions client.
//!
//! DeepSeek speaks the same protocol, so one client serves both; only the
//! base URL and the key variable differ.

use crate::api_types::{ContentBlock, Message, MessagesResponse, Role, Tool};
use crate::llm::{CompletionParams, LlmClient};
use crate::retry::{with_retry, RetryConfig};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    provider_name: String,
    retry: RetryConfig,
}

impl OpenAiClient {
    pub fn new(provider_name: &str, api_key: &str, base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .context("Failed to build HTTP client")?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            provider_name: provider_name.to_string(),
            retry: RetryConfig::default(),
        })
    }

    /// DeepSeek client keyed from `DEEPSEEK_API_KEY`.
    pub fn deepseek(model: &str, base_url: Option<&str>) -> Result<Self> {
        let key = std::env::var("DEEPSEEK_API_KEY")
            .context("DEEPSEEK_API_KEY is not set (use --provider mock to run offline)")?;
        Self::new("DeepSeek", &key, base_url.unwrap_or(DEEPSEEK_BASE_URL), model)
    }

    /// OpenAI client keyed from `OPENAI_API_KEY`.
    pub fn openai(model: &str, base_url: Option<&str>) -> Result<Self> {
        let key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY is not set (use --provider mock to run offline)")?;
        Self::new("OpenAI", &key, base_url.unwrap_or(OPENAI_BASE_URL), model)
    }
}

/// Tool schemas in function-calling format.
pub fn to_openai_tools(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema
                }
            })
        })
        .collect()
}

/// Flatten the block-structured history into chat messages.
///
/// Tool results become `role: tool` messages; assistant tool calls carry
/// their arguments as a JSON string.
pub fn to_openai_messages(system: &str, messages: Vec<Message>) -> Vec<Value> {
    let mut out = vec![json!({ "role": "system", "content": system })];

    for msg in messages {
        match msg.role {
            Role::User => {
                let mut text_parts = Vec::new();
                for block in msg.content {
                    match block {
                        ContentBlock::Text { text } => text_parts.push(text),
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => out.push(json!({
                            "role": "tool",
                            "tool_call_id": tool_use_id,
                            "content": content
                        })),
                        ContentBlock::ToolUse { .. } => {}
                    }
                }
                if !text_parts.is_empty() {
                    out.push(json!({ "role": "user", "content": text_parts.join("\n") }));
                }
            }
            Role::Assistant => {
                let mut text_parts = Vec::new();
                let mut tool_calls = Vec::new();
                for block in msg.content {
                    match block {
                        ContentBlock::Text { text } => text_parts.push(text),
                        ContentBlock::ToolUse { id, name, input } => tool_calls.push(json!({
                            "id": id,
                            "type": "function",
                            "function": { "name": name, "arguments": input.to_string() }
                        })),
                        ContentBlock::ToolResult { .. } => {}
                    }
                }

                let mut obj = json!({ "role": "assistant" });
                obj["content"] = if text_parts.is_empty() {
                    Value::Null
                } else {
                    json!(text_parts.join("\n"))
                };
                if !tool_calls.is_empty() {
                    obj["tool_calls"] = json!(tool_calls);
                }
                out.push(obj);
            }
        }
    }
    out
}

/// Parse a chat completions response body.
pub fn parse_response(body: &Value) -> Result<MessagesResponse> {
    let choice = body["choices"]
        .get(0)
        .context("Response has no choices")?;
    let message = &choice["message"];
    let stop_reason = choice["finish_reason"].as_str().map(str::to_string);

    let mut content = Vec::new();
    if let Some(text) = message["content"].as_str() {
        if !text.is_empty() {
            content.push(ContentBlock::Text {
                text: text.to_string(),
            });
        }
    }

    if let Some(calls) = message["tool_calls"].as_array() {
        for call in calls {
            let id = call["id"].as_str().unwrap_or_default().to_string();
            let func = &call["function"];
            let name = func["name"].as_str().unwrap_or_default().to_string();
            let args = func["arguments"].as_str().unwrap_or("{}");
            let input = serde_json::from_str(args).unwrap_or_else(|e| {
                tracing::warn!("Unparseable arguments for {}: {}", name, e);
                json!({})
            });
            content.push(ContentBlock::ToolUse { id, name, input });
        }
    }

    Ok(MessagesResponse {
        content,
        stop_reason,
    })
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        params: CompletionParams,
    ) -> Result<MessagesResponse> {
        let mut payload = json!({
            "model": self.model,
            "messages": to_openai_messages(system, messages),
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });
        if !tools.is_empty() {
            payload["tools"] = json!(to_openai_tools(&tools));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let (client, url, key, payload) = (&self.client, &url, &self.api_key, &payload);
        let response = with_retry(&self.retry, &self.provider_name, || async move {
            client
                .post(url.as_str())
                .bearer_auth(key)
                .json(payload)
                .send()
                .await
                .map_err(anyhow::Error::from)
        })
        .await?;

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to decode {} response", self.provider_name))?;
        parse_response(&body)
    }
}
