use thiserror::Error;

/// Main error type for the agent system
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} error: {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid function call: {0}")]
    InvalidFunctionCall(String),

    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Maximum iterations exceeded: {0}")]
    MaxIterations(usize),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Interrupted")]
    Interrupted,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Http(err) => err.is_timeout() || err.is_connect(),
            AgentError::Api { status, .. } => *status >= 500,
            AgentError::Validation(_) => true,
            AgentError::RateLimit { .. } => true,
            AgentError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AgentError::Config(_) => "CONFIG_ERROR",
            AgentError::Http(_) => "HTTP_ERROR",
            AgentError::Api { .. } => "API_ERROR",
            AgentError::Serialization(_) => "SERIALIZATION_ERROR",
            AgentError::Validation(_) => "VALIDATION_ERROR",
            AgentError::ToolExecution(_) => "TOOL_EXECUTION_ERROR",
            AgentError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            AgentError::InvalidFunctionCall(_) => "INVALID_FUNCTION_CALL",
            AgentError::InvalidResponse(_) => "INVALID_RESPONSE",
            AgentError::Timeout(_) => "TIMEOUT_ERROR",
            AgentError::MaxIterations(_) => "MAX_ITERATIONS_EXCEEDED",
            AgentError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            AgentError::Interrupted => "INTERRUPTED",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_shape() {
        let error = AgentError::ToolNotFound("lookup".to_string());
        let payload = error.to_error_payload();
        assert_eq!(payload["error"]["code"], "TOOL_NOT_FOUND");
        assert_eq!(payload["error"]["message"], "Tool not found: lookup");
        assert_eq!(payload["error"]["retryable"], false);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::RateLimit { retry_after: 1 }.is_retryable());
        assert!(AgentError::Api {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_retryable());
        assert!(!AgentError::Api {
            status: 401,
            message: "bad key".to_string()
        }
        .is_retryable());
        assert!(!AgentError::Interrupted.is_retryable());
    }
}
