//! Google Gemini client using the native `generateContent` API with function calling.
//!
//! Gemini does not assign ids to function calls, so calls are numbered in the
//! order they appear. Thought signatures returned alongside a call are kept on
//! the [`ToolCall`] and sent back on the next turn.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thali_core::{normalize_model_name, AgentError, ToolCall, ToolSchema, Turn};
use tracing::info;

use crate::model::{ChatModel, ChatResponse, GenerationParams, LlmMetrics, LlmResponse};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// A part is text, a function call, or a function response.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Serialize, Debug)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    error: Option<GeminiError>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Request / Response Mapping
// ============================================================================

fn text_part(text: &str) -> GeminiPart {
    GeminiPart {
        text: Some(text.to_string()),
        ..Default::default()
    }
}

/// Translates scratchpad turns into Gemini `contents`.
fn to_contents(turns: &[Turn]) -> Vec<GeminiContent> {
    turns
        .iter()
        .map(|turn| match turn {
            Turn::User(text) => GeminiContent {
                role: Some("user".into()),
                parts: vec![text_part(text)],
            },
            Turn::ToolCalls(calls) => GeminiContent {
                role: Some("model".into()),
                parts: calls
                    .iter()
                    .map(|c| GeminiPart {
                        function_call: Some(GeminiFunctionCall {
                            name: c.name.clone(),
                            args: c.arguments.clone(),
                        }),
                        thought_signature: c.signature.clone(),
                        ..Default::default()
                    })
                    .collect(),
            },
            Turn::ToolResults(results) => GeminiContent {
                role: Some("user".into()),
                parts: results
                    .iter()
                    .map(|r| GeminiPart {
                        function_response: Some(GeminiFunctionResponse {
                            name: r.name.clone(),
                            response: serde_json::json!({ "content": r.content }),
                        }),
                        ..Default::default()
                    })
                    .collect(),
            },
        })
        .collect()
}

fn build_request(
    system_prompt: &str,
    turns: &[Turn],
    tools: &[ToolSchema],
    params: GenerationParams,
) -> GeminiRequest {
    let tools = match tools.is_empty() {
        true => vec![],
        false => vec![GeminiTool {
            function_declarations: tools
                .iter()
                .map(|t| GeminiFunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }],
    };

    let generation_config = (params.temperature.is_some() || params.max_output_tokens.is_some())
        .then_some(GeminiGenerationConfig {
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
        });

    GeminiRequest {
        contents: to_contents(turns),
        system_instruction: (!system_prompt.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![text_part(system_prompt)],
        }),
        generation_config,
        tools,
    }
}

/// Extracts text or function calls from the first candidate.
fn parse_response(response: GeminiResponse, elapsed_ms: u64) -> Result<ChatResponse, AgentError> {
    if let Some(error) = response.error {
        return Err(AgentError::LlmError(format!("Gemini error: {}", error.message)));
    }

    let metrics = response
        .usage_metadata
        .map(|u| LlmMetrics {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
            elapsed_ms,
        })
        .unwrap_or(LlmMetrics { elapsed_ms, ..Default::default() });

    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let mut text = String::new();
    let mut calls = Vec::new();

    for part in parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(fc) = part.function_call {
            calls.push(ToolCall {
                id: format!("gemini_{}", calls.len()),
                name: fc.name,
                arguments: fc.args,
                signature: part.thought_signature,
            });
        }
    }

    if !calls.is_empty() {
        info!(
            "Gemini: {}ms, tokens: {}/{}, tool_calls: {}",
            elapsed_ms, metrics.input_tokens, metrics.output_tokens, calls.len()
        );
        return Ok(ChatResponse::ToolCalls { calls, metrics });
    }

    info!(
        "Gemini: {}ms, tokens: {}/{}, content: {} chars",
        elapsed_ms, metrics.input_tokens, metrics.output_tokens, text.len()
    );

    Ok(ChatResponse::Content(LlmResponse { content: text, metrics }))
}

// ============================================================================
// Client
// ============================================================================

/// Client for Google's Gemini API.
pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
    api_base: String,
    params: GenerationParams,
}

impl GeminiClient {
    /// Creates a new Gemini client.
    ///
    /// `api_base` defaults to the public v1beta endpoint. `timeout` of `None`
    /// leaves requests unbounded.
    pub fn new(
        model: &str,
        api_key: &str,
        api_base: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, AgentError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self {
            client,
            model: normalize_model_name(model).to_string(),
            api_key: api_key.to_string(),
            api_base: api_base
                .unwrap_or(GEMINI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            params: GenerationParams::default(),
        })
    }

    /// Sets sampling parameters for every request.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
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
        let request = build_request(system_prompt, turns, tools, self.params);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::LlmError(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let resp: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;

        parse_response(resp, start.elapsed().as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use thali_core::ToolResult;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn menu_schema() -> ToolSchema {
        ToolSchema {
            name: "getMenuTool".into(),
            description: "Returns today's menu".into(),
            parameters: json!({
                "type": "object",
                "properties": { "category": { "type": "string" } },
                "required": ["category"]
            }),
        }
    }

    #[test]
    fn request_carries_prompt_tools_and_generation_config() {
        let params = GenerationParams { temperature: Some(0.7), max_output_tokens: Some(2048) };
        let request = build_request("use tools", &[Turn::user("hi")], &[menu_schema()], params);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "use tools");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "getMenuTool");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn request_omits_empty_tools() {
        let request = build_request("", &[Turn::user("hi")], &[], GenerationParams::default());
        let body = serde_json::to_value(&request).unwrap();

        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn tool_turns_round_trip_signatures() {
        let mut call = ToolCall::new("gemini_0", "getMenuTool", json!({ "category": "lunch" }));
        call.signature = Some("sig-abc".into());
        let turns = vec![
            Turn::user("lunch?"),
            Turn::ToolCalls(vec![call.clone()]),
            Turn::ToolResults(vec![ToolResult::for_call(&call, "Dal Fry")]),
        ];

        let body = serde_json::to_value(to_contents(&turns)).unwrap();

        assert_eq!(body[1]["role"], "model");
        assert_eq!(body[1]["parts"][0]["functionCall"]["args"]["category"], "lunch");
        assert_eq!(body[1]["parts"][0]["thoughtSignature"], "sig-abc");
        assert_eq!(body[2]["role"], "user");
        assert_eq!(body[2]["parts"][0]["functionResponse"]["name"], "getMenuTool");
        assert_eq!(body[2]["parts"][0]["functionResponse"]["response"]["content"], "Dal Fry");
    }

    #[test]
    fn parses_function_calls() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{
                        "functionCall": { "name": "getMenuTool", "args": { "category": "dinner" } },
                        "thoughtSignature": "sig"
                    }]
                }
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3 }
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();

        match parse_response(response, 5).unwrap() {
            ChatResponse::ToolCalls { calls, metrics } => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "gemini_0");
                assert_eq!(calls[0].arguments["category"], "dinner");
                assert_eq!(calls[0].signature.as_deref(), Some("sig"));
                assert_eq!(metrics.input_tokens, 12);
                assert_eq!(metrics.output_tokens, 3);
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[test]
    fn parses_text_and_joins_parts() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Lunch is " }, { "text": "Dal Fry." }] }
            }]
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();

        match parse_response(response, 1).unwrap() {
            ChatResponse::Content(resp) => assert_eq!(resp.content, "Lunch is Dal Fry."),
            other => panic!("expected content, got {:?}", other),
        }
    }

    #[test]
    fn missing_candidates_yield_empty_content() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();

        match parse_response(response, 1).unwrap() {
            ChatResponse::Content(resp) => assert!(resp.content.is_empty()),
            other => panic!("expected content, got {:?}", other),
        }
    }

    #[test]
    fn error_body_is_an_error() {
        let response: GeminiResponse =
            serde_json::from_value(json!({ "error": { "message": "quota exceeded" } })).unwrap();

        let err = parse_response(response, 1).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn model_prefix_is_stripped_from_endpoint() {
        let client = GeminiClient::new("models/gemini-2.5-flash", "key", None, None).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    /// Accepts one connection, reads the full request, answers with `reply`
    /// and returns the request head.
    async fn serve_once(listener: TcpListener, reply: String) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();

        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        head
    }

    fn http_reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn local_base(listener: &TcpListener) -> String {
        format!("http://{}", listener.local_addr().unwrap())
    }

    #[tokio::test]
    async fn error_status_is_an_llm_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = local_base(&listener);
        let reply = http_reply("429 Too Many Requests", r#"{"error":{"message":"quota"}}"#);
        let server = tokio::spawn(serve_once(listener, reply));

        let client =
            GeminiClient::new("models/gemini-2.5-flash", "secret-key", Some(&base), None).unwrap();
        let err = client
            .chat_with_tools("use tools", &[Turn::user("hi")], &[menu_schema()])
            .await
            .unwrap_err();
        let head = server.await.unwrap();

        match err {
            AgentError::LlmError(msg) => {
                assert!(msg.contains("429"), "unexpected message: {}", msg);
                assert!(msg.contains("quota"));
            }
            other => panic!("expected LlmError, got {:?}", other),
        }
        assert!(head.starts_with("POST /models/gemini-2.5-flash:generateContent HTTP/1.1\r\n"));
        assert!(head.to_ascii_lowercase().contains("x-goog-api-key: secret-key"));
    }

    #[tokio::test]
    async fn successful_reply_is_parsed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = local_base(&listener);
        let body = json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Dal Fry" }] } }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3 }
        })
        .to_string();
        let server = tokio::spawn(serve_once(listener, http_reply("200 OK", &body)));

        let client = GeminiClient::new("gemini-2.5-flash", "secret-key", Some(&base), None).unwrap();
        let response = client
            .chat_with_tools("use tools", &[Turn::user("lunch?")], &[])
            .await
            .unwrap();
        server.await.unwrap();

        match response {
            ChatResponse::Content(resp) => {
                assert_eq!(resp.content, "Dal Fry");
                assert_eq!(resp.metrics.input_tokens, 12);
                assert_eq!(resp.metrics.output_tokens, 3);
            }
            other => panic!("expected content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn request_timeout_is_an_llm_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = local_base(&listener);
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let client = GeminiClient::new(
            "gemini-2.5-flash",
            "secret-key",
            Some(&base),
            Some(Duration::from_millis(200)),
        )
        .unwrap();
        let err = client
            .chat_with_tools("use tools", &[Turn::user("hi")], &[])
            .await
            .unwrap_err();
        server.abort();

        assert!(matches!(err, AgentError::LlmError(_)));
    }
}
