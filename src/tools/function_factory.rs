use super::{tool::ToolRegistry, Tool};
use crate::{schemas::Validator, AgentError, Result};
use serde_json::Value;
use tracing::debug;

/// Factory for creating and managing function/tool execution
#[derive(Debug, Default)]
pub struct FunctionFactory {
    registry: ToolRegistry,
}

impl FunctionFactory {
    /// Create a new function factory
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
        }
    }

    /// Register a tool with the factory
    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) {
        self.registry.register(tool);
    }

    /// Execute a function call by name. Arguments are checked against the
    /// tool's declared schema before the tool sees them.
    pub async fn execute_function(&self, function_name: &str, parameters: Value) -> Result<Value> {
        let tool = self
            .registry
            .get(function_name)
            .ok_or_else(|| AgentError::ToolNotFound(function_name.to_string()))?;

        let parameters: Value =
            Validator::strict(function_name, tool.parameters_schema()).validate(parameters)?;

        debug!(tool = function_name, "executing tool");
        tool.execute(parameters).await
    }

    /// Get all available tools for OpenAI function calling
    pub fn get_openai_tools(&self) -> Vec<Value> {
        self.registry.to_openai_tools()
    }
}
