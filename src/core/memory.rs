use super::steps::AgentStep;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Conversation context for a single question.
/// Keeps the agent's steps and renders them as OpenAI chat messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMemory {
    steps: Vec<AgentStep>,
    system_prompt: Option<String>,
}

impl AgentMemory {
    /// Create a new memory with optional system prompt
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            steps: Vec::new(),
            system_prompt,
        }
    }

    /// Add a step to memory
    pub fn add_step(&mut self, step: AgentStep) {
        info!(target: "web_search_agent::steps", "{}", step.describe());
        self.steps.push(step);
    }

    pub fn into_steps(self) -> Vec<AgentStep> {
        self.steps
    }

    /// Convert memory to OpenAI message format
    pub fn as_messages(&self) -> Vec<Value> {
        let mut messages = Vec::with_capacity(self.steps.len() + 1);

        if let Some(system_prompt) = &self.system_prompt {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system_prompt
            }));
        }

        messages.extend(self.steps.iter().map(AgentStep::to_message));
        messages
    }
}
