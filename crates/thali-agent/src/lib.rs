//! Bounded tool-calling agent for thali.
//!
//! - [`AgentExecutor`] — Runs the agentic loop against a [`ChatModel`]
//! - [`AgentOutcome`] — Final output plus the intermediate steps taken
//! - [`AgentStep`] — One tool call and the observation it produced
//!
//! # Agentic Loop
//!
//! 1. Send the system prompt, scratchpad and tool schemas to the model
//! 2. If the model returns tool calls, execute them and record the observations
//! 3. Append the calls and results to the scratchpad
//! 4. Repeat until the model returns content or `max_iterations` is reached
//!
//! When the cap is reached the run does not fail; the outcome carries
//! [`MAX_ITERATIONS_OUTPUT`] as its output and callers decide what to do.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use thali_agent::AgentExecutor;
//! use thali_tools::{MenuTable, ToolRegistry};
//!
//! let executor = AgentExecutor::builder(Arc::new(client))
//!     .tools(ToolRegistry::with_menu(MenuTable::default()))
//!     .system_prompt("You are a helpful assistant that uses tools when needed.")
//!     .max_iterations(3)
//!     .return_intermediate_steps(true)
//!     .build();
//!
//! let outcome = executor.invoke("what's on the menu for lunch?").await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use thali_core::{AgentError, ToolCall, ToolResult, Turn};
use thali_llm::{ChatModel, ChatResponse};
use thali_tools::ToolRegistry;
use tracing::{debug, info, warn};

/// Output reported when the iteration cap is reached without a final answer.
pub const MAX_ITERATIONS_OUTPUT: &str = "Agent stopped due to max iterations.";

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// One tool invocation taken during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStep {
    pub action: ToolCall,
    pub observation: String,
}

/// Result of an agent run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentOutcome {
    /// Terminal output, or [`MAX_ITERATIONS_OUTPUT`] if the cap was hit.
    pub output: String,
    /// Tool steps taken, empty unless intermediate steps are enabled.
    pub intermediate_steps: Vec<AgentStep>,
    /// Number of model calls made.
    pub iterations: usize,
}

impl AgentOutcome {
    /// True if the run ended because of the iteration cap.
    pub fn hit_iteration_limit(&self) -> bool {
        self.output == MAX_ITERATIONS_OUTPUT
    }

    /// The answer, if the run produced a usable one.
    pub fn final_answer(&self) -> Option<&str> {
        match self.output.is_empty() || self.hit_iteration_limit() {
            true => None,
            false => Some(&self.output),
        }
    }
}

/// Builder for [`AgentExecutor`].
pub struct AgentExecutorBuilder {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    system_prompt: String,
    max_iterations: usize,
    return_intermediate_steps: bool,
}

impl AgentExecutorBuilder {
    /// Sets the tools the agent may call.
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the iteration cap. Values below 1 are raised to 1.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn return_intermediate_steps(mut self, enabled: bool) -> Self {
        self.return_intermediate_steps = enabled;
        self
    }

    pub fn build(self) -> AgentExecutor {
        AgentExecutor {
            model: self.model,
            tools: Arc::new(self.tools),
            system_prompt: self.system_prompt,
            max_iterations: self.max_iterations,
            return_intermediate_steps: self.return_intermediate_steps,
        }
    }
}

/// Runs a chat model in a bounded tool-calling loop.
///
/// Holds no per-run state, so one executor can serve concurrent requests.
pub struct AgentExecutor {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: usize,
    return_intermediate_steps: bool,
}

impl AgentExecutor {
    /// Starts building an executor around the given model.
    pub fn builder(model: Arc<dyn ChatModel>) -> AgentExecutorBuilder {
        AgentExecutorBuilder {
            model,
            tools: ToolRegistry::new(),
            system_prompt: String::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            return_intermediate_steps: false,
        }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs the agent on a single input.
    ///
    /// Provider errors and tool failures abort the run. Unknown tool names
    /// are reported back to the model as an observation instead.
    pub async fn invoke(&self, input: &str) -> Result<AgentOutcome, AgentError> {
        let schemas = self.tools.list();
        let mut turns = vec![Turn::user(input)];
        let mut steps: Vec<AgentStep> = Vec::new();

        info!("╔══════════════════════════════════════════════════════════════");
        info!("║ AGENT: {} ({} tools, max {} iterations)", self.model.model(), schemas.len(), self.max_iterations);
        debug!("║ Input: {}...", input.chars().take(50).collect::<String>());

        for iteration in 1..=self.max_iterations {
            let response = self
                .model
                .chat_with_tools(&self.system_prompt, &turns, &schemas)
                .await?;

            match response {
                ChatResponse::Content(llm_response) => {
                    info!(
                        "║ [{}] ← Final response: {} chars",
                        iteration,
                        llm_response.content.len()
                    );
                    info!("╚══════════════════════════════════════════════════════════════");
                    return Ok(self.finish(llm_response.content, steps, iteration));
                }
                ChatResponse::ToolCalls { calls, metrics: _ } => {
                    info!(
                        "║ [{}] ← Tool calls: {:?}",
                        iteration,
                        calls.iter().map(|c| &c.name).collect::<Vec<_>>()
                    );

                    let mut results = Vec::with_capacity(calls.len());
                    for call in &calls {
                        let observation = self.run_tool(call).await?;
                        results.push(ToolResult::for_call(call, observation.clone()));
                        steps.push(AgentStep { action: call.clone(), observation });
                    }

                    turns.push(Turn::ToolCalls(calls));
                    turns.push(Turn::ToolResults(results));
                }
            }
        }

        warn!("║ ⚠ Max iterations ({}) reached", self.max_iterations);
        info!("╚══════════════════════════════════════════════════════════════");
        Ok(self.finish(MAX_ITERATIONS_OUTPUT.to_string(), steps, self.max_iterations))
    }

    /// Executes one tool call and returns the observation for the model.
    async fn run_tool(&self, call: &ToolCall) -> Result<String, AgentError> {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!("║     ⚠ Unknown tool requested: {}", call.name);
            return Ok(format!(
                "{} is not a valid tool, try one of [{}].",
                call.name,
                self.tools.tool_names().join(", ")
            ));
        };

        info!("║     → Executing tool: {} {}", call.name, call.arguments);
        let result = tool
            .execute(call.arguments.clone())
            .await
            .map_err(|e| AgentError::ToolFailed {
                name: call.name.clone(),
                message: e.to_string(),
            })?;

        info!("║     ← Tool result: {} chars", result.len());
        Ok(result)
    }

    fn finish(&self, output: String, steps: Vec<AgentStep>, iterations: usize) -> AgentOutcome {
        AgentOutcome {
            output,
            intermediate_steps: match self.return_intermediate_steps {
                true => steps,
                false => Vec::new(),
            },
            iterations,
        }
    }
}
