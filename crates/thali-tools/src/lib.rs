//! Tool registry and the menu lookup tool for thali.
//!
//! - [`Tool`] — Trait for implementing tools the agent can call
//! - [`ToolRegistry`] — Registry for managing available tools
//! - [`MenuTool`] — `getMenuTool`, backed by the static [`MenuTable`]
//!
//! # Implementing a Custom Tool
//!
//! ```rust,ignore
//! use thali_tools::{Tool, ToolError};
//! use async_trait::async_trait;
//!
//! struct ClockTool;
//!
//! #[async_trait]
//! impl Tool for ClockTool {
//!     fn name(&self) -> &str { "clock" }
//!     fn description(&self) -> &str { "Returns the kitchen's opening hours" }
//!     fn parameters(&self) -> serde_json::Value {
//!         serde_json::json!({ "type": "object", "properties": {} })
//!     }
//!     async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
//!         Ok("7am - 10pm".to_string())
//!     }
//! }
//! ```
//!
//! # Using the Registry
//!
//! ```rust
//! use thali_tools::{MenuTool, ToolRegistry};
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(MenuTool::default());
//!
//! assert!(registry.has("getMenuTool"));
//! assert_eq!(registry.list().len(), 1);
//! ```

mod menu;

pub use menu::{MenuCategory, MenuTable, MenuTool, MENU_NOT_FOUND};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub use thali_core::{ToolCall, ToolResult, ToolSchema};

/// Errors that can occur during tool execution.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Tool execution failed with a message.
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    /// Invalid arguments were passed to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Trait for implementing tools that can be called by LLMs.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of this tool.
    fn name(&self) -> &str;

    /// Returns a description of what this tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for this tool's parameters.
    fn parameters(&self) -> serde_json::Value;

    /// Executes the tool with the given JSON arguments.
    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError>;

    /// Generates the schema for this tool (default implementation).
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Registry of tools available to the agent.
///
/// Tools are kept in name order so schemas and error messages are stable.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding only the menu tool.
    pub fn with_menu(table: MenuTable) -> Self {
        let mut registry = Self::new();
        registry.register(MenuTool::new(table));
        registry
    }

    /// Registers a tool in the registry.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns schemas for all registered tools.
    pub fn list(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Returns true if a tool with the given name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the names of all registered tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}
