//! Data transfer objects for HTTP message serialization.

use serde::{Deserialize, Serialize};

/// Request body for the chat endpoint.
///
/// `input` is optional at the type level so a missing field reaches the
/// handler and is answered with the generic failure instead of a 4xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub input: Option<String>,
}

/// Response body for the chat endpoint, used for success and failure alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub output: String,
}

impl ChatResponse {
    pub fn new(output: impl Into<String>) -> Self {
        Self { output: output.into() }
    }
}
