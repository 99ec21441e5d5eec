use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Represents a tool call request from the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to execute
    pub name: String,
    /// Arguments to pass to the tool
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Convert to OpenAI tool call format
    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": self.arguments.to_string()
            }
        })
    }

    /// Get a human-readable description
    pub fn describe(&self) -> String {
        format!("{}({})", self.name, self.arguments)
    }
}

/// Represents the output from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The tool call ID this output corresponds to
    pub tool_call_id: String,
    /// The tool name that was executed
    pub tool_name: String,
    /// The observation handed back to the model
    pub output: String,
    /// Whether the execution resulted in an error
    pub is_error: bool,
    /// Execution duration in milliseconds
    pub duration_ms: Option<u128>,
}

impl ToolOutput {
    /// Create a successful tool output
    pub fn success(tool_call_id: String, tool_name: String, output: String) -> Self {
        Self {
            tool_call_id,
            tool_name,
            output,
            is_error: false,
            duration_ms: None,
        }
    }

    /// Create an error tool output carrying a structured error payload
    pub fn error(tool_call_id: String, tool_name: String, error_payload: Value) -> Self {
        Self {
            tool_call_id,
            tool_name,
            output: error_payload.to_string(),
            is_error: true,
            duration_ms: None,
        }
    }

    /// Set the execution duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis());
        self
    }
}

/// Tracks the execution of a tool call with timing information
#[derive(Debug)]
pub struct ToolExecution {
    pub tool_call: ToolCall,
    start_time: Instant,
}

impl ToolExecution {
    /// Start tracking a tool execution
    pub fn start(tool_call: ToolCall) -> Self {
        Self {
            tool_call,
            start_time: Instant::now(),
        }
    }

    /// Complete the execution and get the output with timing
    pub fn complete(self, output: String) -> ToolOutput {
        let duration = self.start_time.elapsed();
        ToolOutput::success(self.tool_call.id, self.tool_call.name, output).with_duration(duration)
    }

    /// Complete with error
    pub fn complete_with_error(self, error: &crate::AgentError) -> ToolOutput {
        let duration = self.start_time.elapsed();
        ToolOutput::error(
            self.tool_call.id,
            self.tool_call.name,
            error.to_error_payload(),
        )
        .with_duration(duration)
    }
}
