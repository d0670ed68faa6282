//! HTTP route handlers for the menu assistant.

pub mod chat;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
