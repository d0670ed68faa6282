//! Chat endpoint handler.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::dto::{ChatRequest, ChatResponse};
use crate::error::AppError;
use crate::services;
use crate::ServerState;

/// `POST /api/chat`.
///
/// Always answers with `{ "output": ... }`: 200 on success, 500 otherwise.
/// Body rejections are folded into the 500 path.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let request_id = Uuid::new_v4();

    async move {
        let result = handle(&state, payload).await;
        if let Err(e) = &result {
            error!("Error during agent execution: {}", e);
        }
        result
    }
    .instrument(info_span!("chat", %request_id))
    .await
}

async fn handle(
    state: &ServerState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload?;
    let input = req
        .input
        .ok_or_else(|| AppError::Internal("request has no 'input' field".into()))?;

    info!("userInput: {}", input);

    let output = services::chat::answer(state, &input).await?;
    Ok(Json(ChatResponse::new(output)))
}
