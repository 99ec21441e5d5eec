use super::tool_call::ToolCall;
use serde::{Deserialize, Serialize};

/// Represents a single step in the agent's reasoning process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStep {
    /// Question provided by the user
    Task { content: String },
    /// Assistant turn requesting one or more tool calls
    Action {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    /// Observation step capturing the result of a tool execution
    Observation {
        tool_call_id: String,
        result: String,
        is_error: bool,
    },
    /// Final answer from the agent
    FinalAnswer { answer: String },
}

impl AgentStep {
    /// Convert step to OpenAI message format
    pub fn to_message(&self) -> serde_json::Value {
        match self {
            AgentStep::Task { content } => {
                serde_json::json!({
                    "role": "user",
                    "content": content
                })
            }
            AgentStep::Action {
                content,
                tool_calls,
            } => {
                let calls: Vec<_> = tool_calls.iter().map(ToolCall::to_openai_format).collect();
                serde_json::json!({
                    "role": "assistant",
                    "content": content,
                    "tool_calls": calls
                })
            }
            AgentStep::Observation {
                tool_call_id,
                result,
                ..
            } => {
                serde_json::json!({
                    "role": "tool",
                    "tool_call_id": tool_call_id,
                    "content": result
                })
            }
            AgentStep::FinalAnswer { answer } => {
                serde_json::json!({
                    "role": "assistant",
                    "content": answer
                })
            }
        }
    }

    /// Get a human-readable description of the step
    pub fn describe(&self) -> String {
        match self {
            AgentStep::Task { content } => format!("Task: {}", content),
            AgentStep::Action { tool_calls, .. } => {
                let calls: Vec<String> = tool_calls.iter().map(ToolCall::describe).collect();
                format!("Action: {}", calls.join(", "))
            }
            AgentStep::Observation {
                result, is_error, ..
            } => {
                if *is_error {
                    format!("Error: {}", result)
                } else {
                    format!("Observation: {}", result)
                }
            }
            AgentStep::FinalAnswer { answer } => format!("Final Answer: {}", answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_carries_every_call() {
        let step = AgentStep::Action {
            content: None,
            tool_calls: vec![
                ToolCall::new("a", "web_search", json!({"query": "one"})),
                ToolCall::new("b", "web_search", json!({"query": "two"})),
            ],
        };
        let message = step.to_message();
        assert_eq!(message["role"], "assistant");
        assert!(message["content"].is_null());
        assert_eq!(message["tool_calls"].as_array().unwrap().len(), 2);
        assert_eq!(message["tool_calls"][1]["id"], "b");
    }

    #[test]
    fn test_describe_observation_error() {
        let step = AgentStep::Observation {
            tool_call_id: "a".to_string(),
            result: "boom".to_string(),
            is_error: true,
        };
        assert_eq!(step.describe(), "Error: boom");
    }
}
