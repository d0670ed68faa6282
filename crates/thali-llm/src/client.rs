//! OpenAI-compatible chat client with tool calling.
//!
//! Works with the OpenAI API and any compatible endpoint set through `api_base`.

use std::time::{Duration, Instant};

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
        FunctionObject,
    },
    Client,
};
use async_trait::async_trait;
use thali_core::{AgentError, ToolCall, ToolSchema, Turn};
use tracing::info;

use crate::model::{ChatModel, ChatResponse, GenerationParams, LlmMetrics, LlmResponse};

/// Converts any error into an AgentError::LlmError.
pub(crate) fn llm_err(e: impl ToString) -> AgentError {
    AgentError::LlmError(e.to_string())
}

/// Client for OpenAI-compatible chat completion APIs.
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model: String,
    params: GenerationParams,
}

impl LlmClient {
    /// Creates a new client for the given model, key and optional API base URL.
    pub fn new(
        model: &str,
        api_key: &str,
        api_base: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, AgentError> {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }

        let mut client = Client::with_config(config);
        if let Some(timeout) = timeout {
            let http = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| AgentError::Config(e.to_string()))?;
            client = client.with_http_client(http);
        }

        Ok(Self {
            client,
            model: model.to_string(),
            params: GenerationParams::default(),
        })
    }

    /// Sets sampling parameters for every request.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Helper to build a user message.
    pub fn user_message(content: &str) -> Result<ChatCompletionRequestMessage, AgentError> {
        Ok(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(llm_err)?,
        ))
    }

    /// Helper to build an assistant message carrying tool calls.
    pub fn assistant_tool_calls(calls: &[ToolCall]) -> Result<ChatCompletionRequestMessage, AgentError> {
        let tool_calls = calls
            .iter()
            .map(|c| ChatCompletionMessageToolCall {
                id: c.id.clone(),
                r#type: ChatCompletionToolType::Function,
                function: FunctionCall {
                    name: c.name.clone(),
                    arguments: c.arguments.to_string(),
                },
            })
            .collect::<Vec<_>>();

        Ok(ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls)
                .build()
                .map_err(llm_err)?,
        ))
    }

    /// Helper to build a tool result message.
    pub fn tool_result_message(tool_call_id: &str, content: &str) -> Result<ChatCompletionRequestMessage, AgentError> {
        Ok(ChatCompletionRequestMessage::Tool(
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(tool_call_id)
                .content(content)
                .build()
                .map_err(llm_err)?,
        ))
    }

    /// Translates scratchpad turns into chat completion messages.
    pub fn to_messages(
        system_prompt: &str,
        turns: &[Turn],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        let mut messages = vec![ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(llm_err)?,
        )];

        for turn in turns {
            match turn {
                Turn::User(text) => messages.push(Self::user_message(text)?),
                Turn::ToolCalls(calls) => messages.push(Self::assistant_tool_calls(calls)?),
                Turn::ToolResults(results) => {
                    for r in results {
                        messages.push(Self::tool_result_message(&r.tool_call_id, &r.content)?);
                    }
                }
            }
        }

        Ok(messages)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_with_tools(
        &self,
        system_prompt: &str,
        turns: &[Turn],
        tools: &[ToolSchema],
    ) -> Result<ChatResponse, AgentError> {
        let start = Instant::now();

        let openai_tools: Vec<ChatCompletionTool> = tools
            .iter()
            .map(|t| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: t.name.clone(),
                    description: Some(t.description.clone()),
                    parameters: Some(t.parameters.clone()),
                    strict: None,
                },
            })
            .collect();

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .messages(Self::to_messages(system_prompt, turns)?);

        if !openai_tools.is_empty() {
            request_builder.tools(openai_tools);
        }
        if let Some(temperature) = self.params.temperature {
            request_builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.params.max_output_tokens {
            request_builder.max_completion_tokens(max_tokens);
        }

        let request = request_builder.build().map_err(llm_err)?;
        let response = self.client.chat().create(request).await.map_err(llm_err)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let (input_tokens, output_tokens) = response
            .usage
            .as_ref()
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        let metrics = LlmMetrics { input_tokens, output_tokens, elapsed_ms };

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::LlmError("No response choices".into()))?;

        if let Some(tool_calls) = choice.message.tool_calls.filter(|c| !c.is_empty()) {
            let calls = tool_calls
                .into_iter()
                .map(|tc| {
                    let args: serde_json::Value = serde_json::from_str(&tc.function.arguments)?;
                    Ok(ToolCall::new(tc.id, tc.function.name, args))
                })
                .collect::<Result<Vec<_>, AgentError>>()?;

            info!(
                "LLM: {}ms, tokens: {}/{} (in/out), tool_calls: {}",
                elapsed_ms, input_tokens, output_tokens, calls.len()
            );
            return Ok(ChatResponse::ToolCalls { calls, metrics });
        }

        let content = choice.message.content.unwrap_or_default();

        info!("LLM: {}ms, tokens: {}/{} (in/out)", elapsed_ms, input_tokens, output_tokens);

        Ok(ChatResponse::Content(LlmResponse { content, metrics }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thali_core::ToolResult;

    #[test]
    fn turns_map_to_openai_messages() {
        let call = ToolCall::new("call_1", "getMenuTool", serde_json::json!({ "category": "lunch" }));
        let turns = vec![
            Turn::user("what's for lunch?"),
            Turn::ToolCalls(vec![call.clone()]),
            Turn::ToolResults(vec![ToolResult::for_call(&call, "Dal Fry")]),
        ];

        let messages = LlmClient::to_messages("be helpful", &turns).unwrap();

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        match &messages[2] {
            ChatCompletionRequestMessage::Assistant(msg) => {
                let calls = msg.tool_calls.as_ref().unwrap();
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[0].function.name, "getMenuTool");
                assert_eq!(calls[0].function.arguments, r#"{"category":"lunch"}"#);
            }
            other => panic!("expected assistant message, got {:?}", other),
        }
        match &messages[3] {
            ChatCompletionRequestMessage::Tool(msg) => assert_eq!(msg.tool_call_id, "call_1"),
            other => panic!("expected tool message, got {:?}", other),
        }
    }
}
