//! Tool registry.
//!
//! Tools are callable capabilities executed outside the model. The
//! registry advertises their definitions to providers and runs them on
//! request. Execution failures are carried in-band as `is_error`
//! results so a failing tool never aborts the surrounding task.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::llm::ToolDefinition;

/// Outcome of a tool execution.
///
/// `is_error: true` means the content is failure text rather than a
/// usable result.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_name: String,
    pub content: String,
    pub is_error: bool,
}

/// A callable capability.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition advertised to the model: name, description, JSON
    /// input schema.
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with parsed JSON input and returns its text
    /// output. Errors are converted by the registry into `is_error`
    /// results.
    async fn execute(&self, input: Value) -> anyhow::Result<String>;
}

/// Registry of tools, keyed by definition name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same definition name replaces
    /// the existing entry in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.definition().name;
        match self
            .tools
            .iter_mut()
            .find(|t| t.definition().name == name)
        {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.definition().name == name)
            .map(Box::as_ref)
    }

    /// Definitions of all registered tools in insertion order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs a registered tool by name.
    ///
    /// Never fails the caller: an unregistered name or a failing tool
    /// both come back as an `is_error` result.
    pub async fn execute(&self, name: &str, input: Value) -> ToolResult {
        let tool = match self.get(name) {
            Some(t) => t,
            None => {
                return ToolResult {
                    tool_name: name.to_string(),
                    content: format!("Tool not registered: {name}"),
                    is_error: true,
                }
            }
        };
        match tool.execute(input).await {
            Ok(content) => ToolResult {
                tool_name: name.to_string(),
                content,
                is_error: false,
            },
            Err(e) => {
                warn!("Tool '{name}' failed: {e:#}");
                ToolResult {
                    tool_name: name.to_string(),
                    content: format!("Tool execution failed: {e}"),
                    is_error: true,
                }
            }
        }
    }
}
