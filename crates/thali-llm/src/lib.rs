//! LLM client abstractions for Gemini and OpenAI-compatible APIs.
//!
//! - [`ChatModel`] — Trait the agent executor drives, one tool-calling step per call
//! - [`UnifiedLlmClient`] — Recommended: auto-routes to the correct provider
//! - [`GeminiClient`] — Native Gemini `generateContent` client
//! - [`LlmClient`] — OpenAI-compatible client
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use thali_llm::{ChatModel, ChatResponse, GenerationParams, UnifiedLlmClient};
//! use thali_core::Turn;
//!
//! // Gemini models route to the native API, anything else to OpenAI-compatible
//! let client = UnifiedLlmClient::new("gemini-2.5-flash", &api_key, None, None, GenerationParams::default())?;
//!
//! let response = client
//!     .chat_with_tools("You are helpful.", &[Turn::user("Hello!")], &tools)
//!     .await?;
//! match response {
//!     ChatResponse::Content(resp) => println!("{}", resp.content),
//!     ChatResponse::ToolCalls { calls, .. } => {
//!         for call in calls {
//!             println!("Call {}: {}({:?})", call.id, call.name, call.arguments);
//!         }
//!     }
//! }
//! ```

mod client;
mod gemini;
mod model;
mod unified;

pub use client::LlmClient;
pub use gemini::GeminiClient;
pub use model::{ChatModel, ChatResponse, GenerationParams, LlmMetrics, LlmResponse};
pub use thali_core::{ToolCall, ToolResult, ToolSchema, Turn};
pub use unified::UnifiedLlmClient;
