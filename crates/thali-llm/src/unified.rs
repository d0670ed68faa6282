//! Unified LLM client that routes to the appropriate provider based on model name.

use std::time::Duration;

use async_trait::async_trait;
use thali_core::{AgentError, Provider, ToolSchema, Turn};
use tracing::info;

use crate::client::LlmClient;
use crate::gemini::GeminiClient;
use crate::model::{ChatModel, ChatResponse, GenerationParams};

enum Backend {
    Gemini(GeminiClient),
    OpenAi(LlmClient),
}

/// Unified client that routes requests to Gemini or an OpenAI-compatible
/// endpoint based on model name.
pub struct UnifiedLlmClient {
    model: String,
    provider: Provider,
    backend: Backend,
}

impl UnifiedLlmClient {
    /// Creates a new unified client, detecting provider from model name.
    pub fn new(
        model: &str,
        api_key: &str,
        api_base: Option<&str>,
        timeout: Option<Duration>,
        params: GenerationParams,
    ) -> Result<Self, AgentError> {
        let provider = Provider::for_model(model);
        let backend = match provider {
            Provider::Gemini => {
                Backend::Gemini(GeminiClient::new(model, api_key, api_base, timeout)?.with_params(params))
            }
            Provider::OpenAi => {
                Backend::OpenAi(LlmClient::new(model, api_key, api_base, timeout)?.with_params(params))
            }
        };

        info!("LLM client: model={}, provider={:?}", model, provider);

        Ok(Self {
            model: model.to_string(),
            provider,
            backend,
        })
    }

    /// Returns the provider this client routes to.
    pub fn provider(&self) -> Provider {
        self.provider
    }
}

#[async_trait]
impl ChatModel for UnifiedLlmClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_with_tools(
        &self,
        system_prompt: &str,
        turns: &[Turn],
        tools: &[ToolSchema],
    ) -> Result<ChatResponse, AgentError> {
        match &self.backend {
            Backend::Gemini(client) => client.chat_with_tools(system_prompt, turns, tools).await,
            Backend::OpenAi(client) => client.chat_with_tools(system_prompt, turns, tools).await,
        }
    }
}
