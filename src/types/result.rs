use crate::core::steps::AgentStep;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of answering one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Final natural-language answer
    pub text: String,
    /// Wall-clock time from the first request to the final answer
    pub elapsed: Duration,
    /// Every step taken while answering
    #[serde(default)]
    pub steps: Vec<AgentStep>,
    /// Token usage summed over all requests, if the provider reported it
    #[serde(default)]
    pub tokens: Option<TokenUsage>,
    /// Number of model requests issued
    #[serde(default)]
    pub iterations: usize,
}

/// Token usage information from the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn from_response(response: &serde_json::Value) -> Option<Self> {
        let usage = response.get("usage")?;
        Some(Self {
            prompt_tokens: usage.get("prompt_tokens")?.as_u64()?,
            completion_tokens: usage.get("completion_tokens")?.as_u64()?,
            total_tokens: usage.get("total_tokens")?.as_u64()?,
        })
    }

    pub fn accumulate(total: Option<Self>, next: Option<Self>) -> Option<Self> {
        match (total, next) {
            (Some(a), Some(b)) => Some(Self {
                prompt_tokens: a.prompt_tokens.saturating_add(b.prompt_tokens),
                completion_tokens: a.completion_tokens.saturating_add(b.completion_tokens),
                total_tokens: a.total_tokens.saturating_add(b.total_tokens),
            }),
            (a, b) => a.or(b),
        }
    }
}

impl AnswerResult {
    /// Create a result with only an answer and timing, as a stub model would
    pub fn new(text: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            text: text.into(),
            elapsed,
            steps: Vec::new(),
            tokens: None,
            iterations: 0,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Get count of tool calls executed
    pub fn tool_call_count(&self) -> usize {
        self.steps
            .iter()
            .map(|s| match s {
                AgentStep::Action { tool_calls, .. } => tool_calls.len(),
                _ => 0,
            })
            .sum()
    }

    /// Get all error observations
    pub fn errors(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                AgentStep::Observation {
                    result, is_error, ..
                } if *is_error => Some(result.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Generate a human-readable replay of the execution
    pub fn replay(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Agent Execution Trace ===".to_string());
        lines.push(format!("Duration: {:.2}s", self.elapsed_seconds()));
        lines.push(format!("Iterations: {}", self.iterations));

        if let Some(tokens) = &self.tokens {
            lines.push(format!(
                "Tokens: {} prompt + {} completion = {} total",
                tokens.prompt_tokens, tokens.completion_tokens, tokens.total_tokens
            ));
        }

        lines.push(String::new());
        lines.push("--- Steps ---".to_string());

        for (idx, step) in self.steps.iter().enumerate() {
            lines.push(format!("{}. {}", idx + 1, step.describe()));
        }

        lines.push(String::new());
        lines.push("--- Final Output ---".to_string());
        lines.push(self.text.clone());

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tool_call::ToolCall;
    use serde_json::json;

    #[test]
    fn test_stub_result() {
        let result = AnswerResult::new("Paris", Duration::from_millis(420));
        assert_eq!(result.text, "Paris");
        assert_eq!(format!("{:.2}", result.elapsed_seconds()), "0.42");
        assert_eq!(result.tool_call_count(), 0);
    }

    #[test]
    fn test_usage_accumulates() {
        let first = TokenUsage::from_response(&json!({
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }));
        let second = TokenUsage::from_response(&json!({
            "usage": {"prompt_tokens": 20, "completion_tokens": 7, "total_tokens": 27}
        }));
        let total = TokenUsage::accumulate(first, second).unwrap();
        assert_eq!(total.total_tokens, 42);
        assert_eq!(TokenUsage::accumulate(None, second), second);
        assert!(TokenUsage::from_response(&json!({})).is_none());
    }

    #[test]
    fn test_token_usage_large_counts() {
        let big = TokenUsage::from_response(&json!({
            "usage": {
                "prompt_tokens": 5_000_000_000u64,
                "completion_tokens": u64::MAX,
                "total_tokens": u64::MAX
            }
        }));
        assert_eq!(big.map(|u| u.prompt_tokens), Some(5_000_000_000));

        let total = TokenUsage::accumulate(big, big).unwrap();
        assert_eq!(total.prompt_tokens, 10_000_000_000);
        assert_eq!(total.completion_tokens, u64::MAX);
        assert_eq!(total.total_tokens, u64::MAX);
    }

    #[test]
    fn test_replay_and_errors() {
        let mut result = AnswerResult::new("Done", Duration::from_secs(2));
        result.iterations = 2;
        result.steps = vec![
            AgentStep::Task {
                content: "Test".to_string(),
            },
            AgentStep::Action {
                content: None,
                tool_calls: vec![ToolCall::new("1", "web_search", json!({"query": "x"}))],
            },
            AgentStep::Observation {
                tool_call_id: "1".to_string(),
                result: "bad".to_string(),
                is_error: true,
            },
            AgentStep::FinalAnswer {
                answer: "Done".to_string(),
            },
        ];

        assert_eq!(result.tool_call_count(), 1);
        assert_eq!(result.errors(), vec!["bad"]);
        let replay = result.replay();
        assert!(replay.contains("Duration: 2.00s"));
        assert!(replay.contains("Iterations: 2"));
        assert!(replay.contains("Final Answer: Done"));
    }
}
