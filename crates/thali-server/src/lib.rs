//! HTTP server for the thali menu assistant.
//!
//! Routes:
//!
//! - `POST /api/chat` — answer a chat input (menu fast path or agent)
//! - `GET /` — the static chat page (`<static_dir>/index.html`)
//! - `GET /health` — liveness check

pub mod dto;
pub mod error;
pub mod handlers;
pub mod services;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use thali_agent::AgentExecutor;
use thali_config::{AgentSettings, LlmSettings, ServerConfig};
use thali_core::AgentError;
use thali_llm::{ChatModel, GenerationParams, UnifiedLlmClient};
use thali_tools::{MenuTable, ToolRegistry};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared server state accessible from all handlers. Read-only after startup.
pub struct ServerState {
    pub menu: MenuTable,
    pub agent: AgentExecutor,
}

impl ServerState {
    /// Wires the menu table and an agent around the given model.
    pub fn new(menu: MenuTable, model: Arc<dyn ChatModel>, settings: &AgentSettings) -> Self {
        let agent = AgentExecutor::builder(model)
            .tools(ToolRegistry::with_menu(menu.clone()))
            .system_prompt(settings.system_prompt.clone())
            .max_iterations(settings.max_iterations)
            .return_intermediate_steps(true)
            .build();

        info!(
            "Agent ready: tools={:?}, max_iterations={}",
            agent.tools().tool_names(),
            agent.max_iterations()
        );

        Self { menu, agent }
    }

    /// Builds the provider client from configuration and wires the state.
    pub fn from_config(config: &ServerConfig) -> Result<Self, AgentError> {
        let model = build_model(&config.llm)?;
        Ok(Self::new(MenuTable::default(), Arc::new(model), &config.agent))
    }
}

fn build_model(llm: &LlmSettings) -> Result<UnifiedLlmClient, AgentError> {
    UnifiedLlmClient::new(
        &llm.model,
        &llm.api_key,
        llm.api_base.as_deref(),
        llm.timeout,
        GenerationParams {
            temperature: Some(llm.temperature),
            max_output_tokens: Some(llm.max_output_tokens),
        },
    )
}

/// Builds the application router.
pub fn router(state: Arc<ServerState>, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/api/chat", post(handlers::chat::chat))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}
