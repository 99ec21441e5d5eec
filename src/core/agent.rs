use crate::{
    config::ModelConfig,
    error::{AgentError, Result},
    services::openai_client::OpenAIClient,
    tools::{FunctionFactory, WebSearchTool},
    types::result::AnswerResult,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Anything that can turn a question into an answer.
///
/// [`Agent`] is the real implementation; the interactive session only depends
/// on this trait so it can be driven by a stub.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<AnswerResult>;
}

/// Model client bound to an OpenAI-compatible provider plus the tools it may call
#[derive(Debug)]
pub struct Agent {
    openai_client: OpenAIClient,
    function_factory: FunctionFactory,
    max_iterations: usize,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    system_prompt: Option<String>,
}

impl Agent {
    pub fn new(config: ModelConfig, function_factory: FunctionFactory) -> Self {
        Self {
            openai_client: OpenAIClient::new(config),
            function_factory,
            max_iterations: 8,
            max_tokens: Some(1000),
            timeout: None,
            system_prompt: None,
        }
    }

    /// Agent with the `web_search` tool registered, searching through DuckDuckGo
    pub fn with_web_search(config: ModelConfig) -> Self {
        let mut function_factory = FunctionFactory::new();
        function_factory.register_tool(WebSearchTool::new());
        Self::new(config, function_factory)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Bound each model request. Without this the HTTP client's defaults apply.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub(crate) fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub(crate) fn function_factory(&self) -> &FunctionFactory {
        &self.function_factory
    }

    pub fn model(&self) -> &str {
        self.openai_client.model()
    }

    pub fn base_url(&self) -> &str {
        self.openai_client.base_url()
    }

    pub(crate) fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub(crate) fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Answer a question and return only the text
    pub async fn run(&self, prompt: &str) -> Result<String> {
        Ok(self.run_with_steps(prompt).await?.text)
    }

    /// Answer a question and return the full trace
    pub async fn run_with_steps(&self, prompt: &str) -> Result<AnswerResult> {
        self.answer(prompt, self.max_tokens()).await
    }

    pub(crate) async fn make_raw_request(&self, request_body: &Value) -> Result<Value> {
        match self.timeout {
            Some(limit) => {
                tokio::time::timeout(limit, self.openai_client.chat_completion(request_body))
                    .await
                    .map_err(|_| AgentError::Timeout("Model API call timed out".to_string()))?
            }
            None => self.openai_client.chat_completion(request_body).await,
        }
    }
}

#[async_trait]
impl AnswerGenerator for Agent {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<AnswerResult> {
        self.answer(prompt, Some(max_tokens)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let agent = Agent::with_web_search(ModelConfig::new("sk-test"));
        assert_eq!(agent.model(), "mercury");
        assert_eq!(agent.base_url(), "https://api.inceptionlabs.ai/v1");
        assert_eq!(agent.max_iterations(), 8);
        assert_eq!(agent.max_tokens(), Some(1000));
        assert!(agent.system_prompt().is_none());
        let tools = agent.function_factory().get_openai_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["function"]["name"], "web_search");
    }

    #[test]
    fn test_builder_overrides() {
        let agent = Agent::new(ModelConfig::new("sk-test"), FunctionFactory::new())
            .with_max_iterations(3)
            .with_max_tokens(None)
            .with_system_prompt("Be brief");
        assert_eq!(agent.max_iterations(), 3);
        assert_eq!(agent.max_tokens(), None);
        assert_eq!(agent.system_prompt(), Some("Be brief"));
        assert!(agent.function_factory().get_openai_tools().is_empty());
    }
}
