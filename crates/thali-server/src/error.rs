//! Application error types and Axum response conversion.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thali_core::AgentError;

use crate::dto::ChatResponse;

/// Shown when the agent ends without a usable answer.
pub const NO_VALID_ANSWER: &str = "Agent couldn't find a valid answer.";

/// Shown for every other failure. Details stay in the log.
pub const GENERIC_FAILURE: &str = "Sorry, something went wrong. Please try again.";

/// Chat failures. Both variants render as status 500 with an `output` message.
#[derive(Debug)]
pub enum AppError {
    /// The agent returned empty output or hit its iteration cap.
    NoValidAnswer,
    /// Anything else; the detail is for logging only.
    Internal(String),
}

impl AppError {
    /// Message returned to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::NoValidAnswer => NO_VALID_ANSWER,
            AppError::Internal(_) => GENERIC_FAILURE,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NoValidAnswer => f.write_str(NO_VALID_ANSWER),
            AppError::Internal(detail) => f.write_str(detail),
        }
    }
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Internal(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ChatResponse::new(self.public_message())),
        )
            .into_response()
    }
}
