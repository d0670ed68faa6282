//! Provider-neutral chat model trait and response types.

use async_trait::async_trait;
use thali_core::{AgentError, ToolCall, ToolSchema, Turn};

/// Token usage and timing metrics from an LLM call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmMetrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

/// Complete text response from an LLM call.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    pub metrics: LlmMetrics,
}

/// Response from an LLM that may include tool calls.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatResponse {
    Content(LlmResponse),
    ToolCalls { calls: Vec<ToolCall>, metrics: LlmMetrics },
}

impl ChatResponse {
    /// Usage metrics regardless of the response kind.
    pub fn metrics(&self) -> &LlmMetrics {
        match self {
            ChatResponse::Content(resp) => &resp.metrics,
            ChatResponse::ToolCalls { metrics, .. } => metrics,
        }
    }
}

/// Sampling parameters forwarded to the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// A chat model that can take one step of a tool-calling conversation.
///
/// Implemented by the provider clients; the agent executor only talks to
/// this trait, which lets tests script model behavior.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier used for logging.
    fn model(&self) -> &str;

    /// Sends the system prompt, conversation turns and tool schemas.
    /// Returns either final content or the tool calls the model wants run.
    async fn chat_with_tools(
        &self,
        system_prompt: &str,
        turns: &[Turn],
        tools: &[ToolSchema],
    ) -> Result<ChatResponse, AgentError>;
}
