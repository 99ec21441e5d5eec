use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    config::ModelConfig,
    error::{AgentError, Result},
};

const MAX_RETRIES: usize = 2;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Clone, Debug)]
pub struct OpenAIClient {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let request_url = build_chat_url(&self.config.base_url);
        let mut attempt = 0;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            debug!(url = %request_url, attempt, "sending chat completion request");

            let response = self
                .http
                .post(&request_url)
                .header("Authorization", format!("Bearer {}", self.config.api_key))
                .header("Content-Type", "application/json")
                .json(body)
                .send()
                .await?;

            let status = response.status();
            let headers = response.headers().clone();
            let response_text = response.text().await?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_duration = headers
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                if attempt < MAX_RETRIES {
                    warn!(
                        "rate limited by provider, retrying in {:?}",
                        retry_after_duration
                    );
                    tokio::time::sleep(retry_after_duration).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                return Err(AgentError::RateLimit {
                    retry_after: retry_after_duration.as_secs().max(1),
                });
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                warn!("provider returned {}, retrying in {:?}", status, backoff);
                tokio::time::sleep(backoff).await;
                attempt += 1;
                backoff *= 2;
                continue;
            }

            if !status.is_success() {
                let api_message = serde_json::from_str::<Value>(&response_text)
                    .ok()
                    .and_then(|json| {
                        json.get("error")
                            .and_then(|error| error.get("message"))
                            .and_then(|value| value.as_str())
                            .map(|s| s.to_string())
                    })
                    .unwrap_or(response_text);

                return Err(AgentError::Api {
                    status: status.as_u16(),
                    message: api_message,
                });
            }

            let response_json: Value = serde_json::from_str(&response_text).map_err(|err| {
                AgentError::InvalidResponse(format!("Failed to parse JSON: {err}"))
            })?;

            if let Some(error) = response_json.get("error").filter(|error| !error.is_null()) {
                let error_message = error
                    .get("message")
                    .and_then(|value| value.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| error.to_string());
                return Err(AgentError::Api {
                    status: status.as_u16(),
                    message: error_message,
                });
            }

            return Ok(response_json);
        }
    }
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    tools: Vec<Value>,
    tool_choice: Option<Value>,
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            tool_choice: None,
            max_tokens: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: Value) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if !self.tools.is_empty() {
            body["tools"] = Value::Array(self.tools);
        }

        if let Some(tool_choice) = self.tool_choice {
            body["tool_choice"] = tool_choice;
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://api.inceptionlabs.ai/v1"),
            "https://api.inceptionlabs.ai/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("https://api.inceptionlabs.ai/v1/"),
            "https://api.inceptionlabs.ai/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost/v1/chat/completions"),
            "http://localhost/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_omits_empty_tools() {
        let body = ChatCompletionRequest::new("mercury", vec![json!({"role": "user"})])
            .with_max_tokens(None)
            .into_value();
        assert_eq!(body["model"], "mercury");
        assert!(body.get("tools").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_request_body_with_tools() {
        let body = ChatCompletionRequest::new("mercury", Vec::new())
            .with_tools(vec![json!({"type": "function"})])
            .with_tool_choice(json!("auto"))
            .with_max_tokens(Some(1000))
            .into_value();
        assert_eq!(body["tools"].as_array().map(|t| t.len()), Some(1));
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["max_tokens"], 1000);
    }
}
