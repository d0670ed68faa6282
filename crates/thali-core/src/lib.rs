//! Core domain types and error definitions for thali.
//!
//! This crate provides the types shared by the agent, the LLM clients and the
//! tools:
//!
//! - [`AgentError`] — Error type for agent runs and LLM operations
//! - [`Provider`] — Provider family detected from a model name
//! - [`Turn`] — One entry of the agent scratchpad sent to the model
//! - [`ToolCall`], [`ToolResult`], [`ToolSchema`] — Tool interaction types
//!
//! # Example
//!
//! ```rust
//! use thali_core::{ToolCall, ToolResult, Turn};
//!
//! let call = ToolCall::new("call_0", "getMenuTool", serde_json::json!({ "category": "lunch" }));
//! let turns = vec![
//!     Turn::user("what's for lunch?"),
//!     Turn::ToolCalls(vec![call.clone()]),
//!     Turn::ToolResults(vec![ToolResult::for_call(&call, "Dal Fry")]),
//! ];
//!
//! assert_eq!(turns.len(), 3);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during an agent run or an LLM operation.
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM API request failed.
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// Failed to parse a provider response or tool arguments.
    #[error("Failed to parse: {0}")]
    ParseError(String),

    /// A tool was invoked but failed.
    #[error("Tool '{name}' failed: {message}")]
    ToolFailed { name: String, message: String },

    /// The provider could not be configured (missing key, bad base URL).
    #[error("Provider configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::ParseError(err.to_string())
    }
}

// ============================================================================
// Providers
// ============================================================================

/// LLM provider family, determined from the model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Google Gemini via the native `generateContent` API.
    Gemini,
    /// Any OpenAI-compatible chat completions endpoint.
    OpenAi,
}

impl Provider {
    /// Detects the provider from a model name such as `models/gemini-2.5-flash`.
    pub fn for_model(model: &str) -> Self {
        match normalize_model_name(model).starts_with("gemini") {
            true => Provider::Gemini,
            false => Provider::OpenAi,
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Strips the `models/` resource prefix Google uses in model names.
pub fn normalize_model_name(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

// ============================================================================
// Tool Types
// ============================================================================

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier used to match the result to this call.
    pub id: String,
    /// Name of the tool to execute.
    pub name: String,
    /// Arguments to pass to the tool (JSON object).
    pub arguments: serde_json::Value,
    /// Opaque provider token that must be echoed back with the call
    /// (Gemini thought signatures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ToolCall {
    /// Creates a tool call without a provider signature.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            signature: None,
        }
    }
}

/// Result of a tool execution to be sent back to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID from the original tool call request.
    pub tool_call_id: String,
    /// Name of the tool that produced the result.
    pub name: String,
    /// Output content from the tool execution.
    pub content: String,
}

impl ToolResult {
    /// Builds the result for a given call.
    pub fn for_call(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
        }
    }
}

/// JSON schema describing a tool for LLM function calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique name of the tool (e.g., "getMenuTool").
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

// ============================================================================
// Scratchpad
// ============================================================================

/// One entry in the conversation an agent sends to the model.
///
/// Providers translate turns into their own wire format: the OpenAI client
/// maps them to chat completion messages, the Gemini client to `contents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Turn {
    /// Text from the user.
    User(String),
    /// Tool calls the model asked for.
    ToolCalls(Vec<ToolCall>),
    /// Results for the preceding tool calls.
    ToolResults(Vec<ToolResult>),
}

impl Turn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Turn::User(content.into())
    }
}
