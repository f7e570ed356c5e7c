use crate::api_types::{Message, MessagesResponse, Tool};
use anyhow::Result;
use async_trait::async_trait;

/// Sampling parameters for one completion.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request with tool definitions.
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        tools: Vec<Tool>,
        params: CompletionParams,
    ) -> Result<MessagesResponse>;
}

// Providers available in crate::providers
