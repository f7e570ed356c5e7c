pub mod mock;
pub mod openai;

use crate::llm::LlmClient;
use anyhow::Result;
use canis_core::config::LlmConfig;
use std::sync::Arc;

pub use mock::MockProvider;
pub use openai::OpenAiClient;

/// Build the client named by `[llm] provider`.
pub fn from_config(cfg: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let base_url = cfg.base_url.as_deref();
    let client: Arc<dyn LlmClient> = match cfg.provider.as_str() {
        "deepseek" => Arc::new(OpenAiClient::deepseek(&cfg.model, base_url)?),
        "openai" => Arc::new(OpenAiClient::openai(&cfg.model, base_url)?),
        "mock" => Arc::new(MockProvider::new(&cfg.model)),
        other => anyhow::bail!(
            "Unknown LLM provider '{}' (expected deepseek, openai or mock)",
            other
        ),
    };
    tracing::info!("LLM provider: {} ({})", cfg.provider, cfg.model);
    Ok(client)
}
